
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    Big,
    #[default]
    Little,
}

// Pairs up bytes into words. A trailing odd byte is ignored.
pub fn words_from_bytes(input: &[u8], endian: Endian) -> Vec<u16> {
    input
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            match endian {
                Endian::Big => u16::from_be_bytes(pair),
                Endian::Little => u16::from_le_bytes(pair),
            }
        })
        .collect()
}

pub fn bytes_from_words(input: &[u16], endian: Endian) -> Vec<u8> {
    input
        .iter()
        .flat_map(|word| match endian {
            Endian::Big => word.to_be_bytes(),
            Endian::Little => word.to_le_bytes(),
        })
        .collect()
}
