/*!

The credential helper wire format.

Input is a sequence of `key=value` lines ended by a blank line or by
end of input. Only the first `=` separates key from value, so values
may contain `=`. Keys this helper doesn't know are skipped, which keeps
older helpers working when the caller learns new keys.

Lines are handled as bytes. Only the values of recognized keys are
decoded: the password is kept byte for byte, and the other fields
(which become Secret Service attributes, and so must be text) are
decoded as UTF-8 with invalid sequences replaced.

Output is deliberately narrower than input: only `username` and
`password` are ever written back, and only when set. The caller already
knows the protocol, host and path it asked about.

*/

use std::io::{BufRead, Write};

use log::warn;

use crate::cred::Credential;
use crate::errors::ProtocolError;

/// Read a credential description into `cred`.
///
/// On an invalid line the fields read so far stay in `cred`.
pub fn read_credential(
    input: &mut impl BufRead,
    cred: &mut Credential,
) -> Result<(), ProtocolError> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        let text = line.strip_suffix(b"\n").unwrap_or(line.as_slice());
        let text = text.strip_suffix(b"\r").unwrap_or(text);
        if text.is_empty() {
            return Ok(());
        }
        let Some(split) = text.iter().position(|&b| b == b'=') else {
            return Err(ProtocolError::InvalidLine(
                String::from_utf8_lossy(text).into_owned(),
            ));
        };
        let (key, value) = (&text[..split], &text[split + 1..]);
        match key {
            b"protocol" => cred.protocol = Some(decode(key, value)),
            b"host" => cred.host = Some(decode(key, value)),
            b"path" => cred.path = Some(decode(key, value)),
            b"username" => cred.username = Some(decode(key, value)),
            b"password" => cred.set_password(value),
            _ => (),
        }
    }
}

fn decode(key: &[u8], value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(value) => value.to_string(),
        Err(_) => {
            warn!("{} is not valid UTF-8", String::from_utf8_lossy(key));
            String::from_utf8_lossy(value).into_owned()
        }
    }
}

/// Write the caller-visible fields of `cred`.
pub fn write_credential(output: &mut impl Write, cred: &Credential) -> std::io::Result<()> {
    write_item(output, "username", cred.username.as_deref().map(str::as_bytes))?;
    write_item(output, "password", cred.password())?;
    output.flush()
}

fn write_item(output: &mut impl Write, key: &str, value: Option<&[u8]>) -> std::io::Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    output.write_all(key.as_bytes())?;
    output.write_all(b"=")?;
    output.write_all(value)?;
    output.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> (Credential, Result<(), ProtocolError>) {
        read_bytes(input.as_bytes())
    }

    fn read_bytes(mut input: &[u8]) -> (Credential, Result<(), ProtocolError>) {
        let mut cred = Credential::new();
        let result = read_credential(&mut input, &mut cred);
        (cred, result)
    }

    fn write(cred: &Credential) -> String {
        let mut out = Vec::new();
        write_credential(&mut out, cred).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_read_all_fields() {
        let (cred, result) = read(
            "protocol=https\nhost=example.com\npath=a/b.git\nusername=alice\npassword=s3cret\n\n",
        );
        result.unwrap();
        assert_eq!(cred.protocol.as_deref(), Some("https"));
        assert_eq!(cred.host.as_deref(), Some("example.com"));
        assert_eq!(cred.path.as_deref(), Some("a/b.git"));
        assert_eq!(cred.username.as_deref(), Some("alice"));
        assert_eq!(cred.password(), Some(&b"s3cret"[..]));
    }

    #[test]
    fn test_value_keeps_later_equals() {
        let (cred, result) = read("password=a=b==c\n");
        result.unwrap();
        assert_eq!(cred.password(), Some(&b"a=b==c"[..]));
    }

    #[test]
    fn test_last_write_wins() {
        let (cred, result) = read("username=first\nusername=second\n");
        result.unwrap();
        assert_eq!(cred.username.as_deref(), Some("second"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let (cred, result) = read("wwwauth[]=Basic realm=x\nprotocol=http\n");
        result.unwrap();
        assert_eq!(cred.protocol.as_deref(), Some("http"));
        assert!(cred.host.is_none());
    }

    #[test]
    fn test_stops_at_blank_line() {
        let (cred, result) = read("host=a.com\n\nhost=b.com\n");
        result.unwrap();
        assert_eq!(cred.host.as_deref(), Some("a.com"));
    }

    #[test]
    fn test_end_of_input_without_newline() {
        let (cred, result) = read("host=a.com");
        result.unwrap();
        assert_eq!(cred.host.as_deref(), Some("a.com"));
    }

    #[test]
    fn test_crlf_lines() {
        let (cred, result) = read("host=a.com\r\n\r\nusername=x\r\n");
        result.unwrap();
        assert_eq!(cred.host.as_deref(), Some("a.com"));
        assert!(cred.username.is_none());
    }

    #[test]
    fn test_invalid_line_keeps_earlier_fields() {
        let (cred, result) = read("protocol=http\ngarbageline\nhost=a.com\n");
        match result {
            Err(ProtocolError::InvalidLine(line)) => assert_eq!(line, "garbageline"),
            other => panic!("expected an invalid line, got {other:?}"),
        }
        assert_eq!(cred.protocol.as_deref(), Some("http"));
        assert!(cred.host.is_none());
    }

    #[test]
    fn test_empty_value_is_set() {
        let (cred, result) = read("username=\n");
        result.unwrap();
        assert_eq!(cred.username.as_deref(), Some(""));
        assert_eq!(write(&cred), "username=\n");
    }

    #[test]
    fn test_write_only_username_and_password() {
        let (cred, result) = read(
            "protocol=https\nhost=example.com\npath=repo\nusername=alice\npassword=pw\n",
        );
        result.unwrap();
        assert_eq!(write(&cred), "username=alice\npassword=pw\n");
    }

    #[test]
    fn test_write_skips_unset() {
        let mut cred = Credential::new();
        assert_eq!(write(&cred), "");
        cred.set_password(b"pw");
        assert_eq!(write(&cred), "password=pw\n");
    }

    #[test]
    fn test_unknown_key_with_invalid_utf8_is_skipped() {
        let (cred, result) =
            read_bytes(b"protocol=https\nwwwauth[]=Basic realm=\"caf\xE9\"\nhost=a.com\n\n");
        result.unwrap();
        assert_eq!(cred.protocol.as_deref(), Some("https"));
        assert_eq!(cred.host.as_deref(), Some("a.com"));
    }

    #[test]
    fn test_password_bytes_kept_verbatim() {
        let (cred, result) = read_bytes(b"username=alice\npassword=caf\xE9\n\n");
        result.unwrap();
        assert_eq!(cred.password(), Some(&b"caf\xE9"[..]));
        let mut out = Vec::new();
        write_credential(&mut out, &cred).unwrap();
        assert_eq!(out, b"username=alice\npassword=caf\xE9\n");
    }

    #[test]
    fn test_invalid_utf8_text_field_is_replaced() {
        let (cred, result) = read_bytes(b"host=caf\xE9.example\n");
        result.unwrap();
        assert_eq!(cred.host.as_deref(), Some("caf\u{FFFD}.example"));
    }
}
