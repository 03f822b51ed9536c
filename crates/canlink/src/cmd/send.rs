use canlink_frame::{CanFrame, Payload};
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{link_error, payload_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let config = args.port.serial_config()?;

    let link = canlink_link::open(&config).map_err(|err| link_error("open failed", err))?;
    let frame = CanFrame::new(u32::from(args.id), payload);
    link.send_frame(&frame)
        .map_err(|err| link_error("send failed", err))?;
    debug!(port = %link.label(), id = frame.id(), "frame sent");

    print_frame("sent", &frame, link.label(), format);
    link.close();
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Payload> {
    if let Some(text) = &args.data {
        return Payload::from_text(text).map_err(|err| payload_error("--data", err));
    }
    if let Some(hex) = &args.hex {
        return Payload::from_hex(hex).map_err(|err| payload_error("--hex", err));
    }
    if let Some(values) = &args.bytes {
        return Payload::from_values(values.as_slice())
            .map_err(|err| payload_error("--bytes", err));
    }
    Ok(Payload::default())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::exit::DATA_INVALID;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        send: SendArgs,
    }

    fn parse(args: &[&str]) -> SendArgs {
        let argv = ["send", "/dev/ttyUSB0", "--id", "0x35E"]
            .iter()
            .chain(args)
            .copied();
        TestCli::try_parse_from(argv)
            .expect("send args should parse")
            .send
    }

    #[test]
    fn text_payload_is_padded() {
        let payload = resolve_payload(&parse(&["--data", "HELLO"])).unwrap();
        assert_eq!(payload.as_bytes(), b"HELLO\0\0\0");
    }

    #[test]
    fn hex_and_byte_payloads() {
        let payload = resolve_payload(&parse(&["--hex", "11 22 33"])).unwrap();
        assert_eq!(&payload.as_bytes()[..3], [0x11, 0x22, 0x33]);

        let payload = resolve_payload(&parse(&["--bytes", "1,2,255"])).unwrap();
        assert_eq!(&payload.as_bytes()[..3], [1, 2, 255]);
    }

    #[test]
    fn missing_payload_is_all_zero() {
        let payload = resolve_payload(&parse(&[])).unwrap();
        assert_eq!(payload.into_bytes(), [0u8; 8]);
    }

    #[test]
    fn invalid_payloads_are_data_errors() {
        let err = resolve_payload(&parse(&["--bytes", "1,256"])).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);

        let err = resolve_payload(&parse(&["--hex", "zz"])).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);

        let err = resolve_payload(&parse(&["--data", "héllo"])).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
