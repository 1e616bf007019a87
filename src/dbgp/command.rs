use crate::util::quote_arg;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Serialize one DBGp command line:
/// `name -i <tx> [-flag value]... [ -- <base64 data>]` plus the trailing
/// NUL. Commands carry no length prefix; only engine-to-server frames do.
pub fn encode(command: &str, transaction_id: u32, args: &[(&str, String)], data: Option<&[u8]>) -> Vec<u8> {
    let mut line = format!("{command} -i {transaction_id}");
    for (flag, value) in args {
        line.push_str(" -");
        line.push_str(flag);
        line.push(' ');
        line.push_str(&quote_arg(value));
    }
    if let Some(data) = data {
        line.push_str(" -- ");
        line.push_str(&BASE64.encode(data));
    }
    let mut bytes = line.into_bytes();
    bytes.push(0);
    bytes
}
