use std::fs;
use std::path::Path;

use miette::NamedSource;

use crate::error::ImageError;
use crate::runtime::MEMORY_SIZE;

/// Program bytes parsed from a text image, ready to be loaded at address 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    /// Read and parse the image stored at `path`.
    pub fn read(path: &Path) -> Result<Image, ImageError> {
        let src = fs::read_to_string(path).map_err(|source| ImageError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Image::parse(&path.display().to_string(), &src)
    }

    /// Parse image text: one binary literal per line, `#` starts a comment.
    pub fn parse(name: &str, src: &str) -> Result<Image, ImageError> {
        let mut bytes = Vec::new();
        let mut offset = 0;

        for (i, line) in src.split_inclusive('\n').enumerate() {
            let code = line.split('#').next().unwrap_or_default();
            let value = code.trim();
            if !value.is_empty() {
                let digits_only = value.bytes().all(|b| b == b'0' || b == b'1');
                let parsed = if digits_only {
                    u8::from_str_radix(value, 2).ok()
                } else {
                    None
                };
                let byte = parsed.ok_or_else(|| {
                    let start = offset + (code.len() - code.trim_start().len());
                    ImageError::InvalidLiteral {
                        line: i + 1,
                        src: NamedSource::new(name, src.to_string()),
                        span: (start, value.len()).into(),
                    }
                })?;
                bytes.push(byte);
            }
            offset += line.len();
        }

        if bytes.len() > MEMORY_SIZE {
            return Err(ImageError::TooLarge { len: bytes.len() });
        }
        Ok(Image { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_comments_and_blanks() {
        let src = "\
# print8.ls8: Print the number 8 on the screen

10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";
        let image = Image::parse("print8.ls8", src).unwrap();
        assert_eq!(
            image.bytes(),
            &[0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]
        );
        assert_eq!(image.len(), 6);
    }

    #[test]
    fn accepts_crlf_and_short_literals() {
        let image = Image::parse("crlf", "  101\r\n1#x\r\n\r\n").unwrap();
        assert_eq!(image.bytes(), &[5, 1]);
    }

    #[test]
    fn empty_image() {
        let image = Image::parse("empty", "# nothing here\n\n").unwrap();
        assert!(image.is_empty());
    }

    #[test]
    fn rejects_bad_literals() {
        let src = "10000010\n  0000002 # not binary\n";
        match Image::parse("bad", src) {
            Err(ImageError::InvalidLiteral { line, span, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(span.offset(), 11);
                assert_eq!(span.len(), 7);
            }
            other => panic!("expected invalid literal, got {other:?}"),
        }

        // Sign prefixes are not binary digits
        assert!(matches!(
            Image::parse("sign", "00000001\n+101\n"),
            Err(ImageError::InvalidLiteral { line: 2, .. })
        ));
        assert!(matches!(
            Image::parse("sign", "-0\n"),
            Err(ImageError::InvalidLiteral { line: 1, .. })
        ));

        // Does not fit in a byte
        assert!(matches!(
            Image::parse("wide", "100000000\n"),
            Err(ImageError::InvalidLiteral { line: 1, .. })
        ));
    }

    #[test]
    fn rejects_oversized_image() {
        let src = "00000001\n".repeat(MEMORY_SIZE + 1);
        assert!(matches!(
            Image::parse("big", &src),
            Err(ImageError::TooLarge { len: 257 })
        ));
        assert!(Image::parse("full", &"00000001\n".repeat(MEMORY_SIZE)).is_ok());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Image::read(Path::new("does/not/exist.ls8")),
            Err(ImageError::FileNotFound { .. })
        ));
    }
}
