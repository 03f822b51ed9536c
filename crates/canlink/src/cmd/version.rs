use canlink_frame::{COMMAND, END, START, WIRE_SIZE};
use canlink_transport::DEFAULT_BAUD_RATE;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("canlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: canlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("CANLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "wire: {WIRE_SIZE} bytes, start=0x{START:02X} command=0x{COMMAND:02X} end=0x{END:02X}"
    );
    println!("default_baud: {DEFAULT_BAUD_RATE}");
    println!("features: link={}, cli=true", cfg!(feature = "link"));

    Ok(SUCCESS)
}
