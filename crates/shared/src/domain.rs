use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(RequestId);
id_newtype!(NotificationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Encrypted,
    Decrypted,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Encrypted => "encrypted",
            Self::Decrypted => "decrypted",
        }
    }
}

/// A file the remote service has recorded for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferRole {
    Encrypt,
    Decrypt,
}

const ENCRYPTED_SUFFIX: &str = ".enc";
const ENCRYPT_EXTENSIONS: &[&str] = &["pdf", "docx", "pptx", "jpg", "png", "txt"];
const DECRYPT_EXTENSIONS: &[&str] = &["enc"];

impl TransferRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
        }
    }

    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Encrypt => ENCRYPT_EXTENSIONS,
            Self::Decrypt => DECRYPT_EXTENSIONS,
        }
    }

    /// Client-side picker filter; the service itself accepts anything.
    pub fn accepts(self, file_name: &str) -> bool {
        let Some((_, extension)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.accepted_extensions()
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(extension))
    }

    /// Name under which the service's output is saved locally.
    pub fn output_name(self, input_name: &str) -> String {
        match self {
            Self::Encrypt => format!("{input_name}{ENCRYPTED_SUFFIX}"),
            Self::Decrypt => match strip_encrypted_suffix(input_name) {
                Some("") => "decrypted".to_string(),
                Some(stripped) => stripped.to_string(),
                None => input_name.to_string(),
            },
        }
    }
}

/// Drops one trailing `.enc`, matched case-insensitively like the staging filter.
fn strip_encrypted_suffix(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(ENCRYPTED_SUFFIX.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, suffix) = name.split_at(split);
    suffix.eq_ignore_ascii_case(ENCRYPTED_SUFFIX).then_some(stem)
}

impl fmt::Display for TransferRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_output_appends_suffix() {
        assert_eq!(TransferRole::Encrypt.output_name("report.pdf"), "report.pdf.enc");
    }

    #[test]
    fn decrypt_output_strips_only_trailing_suffix() {
        assert_eq!(TransferRole::Decrypt.output_name("report.pdf.enc"), "report.pdf");
        assert_eq!(
            TransferRole::Decrypt.output_name("my.enc.notes.txt.enc"),
            "my.enc.notes.txt"
        );
        assert_eq!(TransferRole::Decrypt.output_name("plain.txt"), "plain.txt");
        assert_eq!(TransferRole::Decrypt.output_name(".enc"), "decrypted");
        assert_eq!(TransferRole::Decrypt.output_name("REPORT.PDF.ENC"), "REPORT.PDF");
        assert_eq!(TransferRole::Decrypt.output_name("notes.Enc"), "notes");
        assert_eq!(TransferRole::Decrypt.output_name("été"), "été");
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(TransferRole::Encrypt.accepts("Scan.PDF"));
        assert!(TransferRole::Encrypt.accepts("notes.txt"));
        assert!(!TransferRole::Encrypt.accepts("archive.zip"));
        assert!(!TransferRole::Encrypt.accepts("README"));
        assert!(TransferRole::Decrypt.accepts("report.pdf.enc"));
        assert!(!TransferRole::Decrypt.accepts("report.pdf"));
    }

    #[test]
    fn file_record_uses_type_key_on_the_wire() {
        let record: FileRecord =
            serde_json::from_str(r#"{"name":"a.txt","type":"encrypted"}"#).expect("decode");
        assert_eq!(record.kind, FileKind::Encrypted);
        let encoded = serde_json::to_value(&record).expect("encode");
        assert_eq!(encoded["type"], "encrypted");
    }
}
