use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("mbfirmata {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: mbfirmata");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("MBFIRMATA_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("MBFIRMATA_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: board={}, async={}, cli=true",
        cfg!(feature = "board"),
        cfg!(feature = "async")
    );
    println!(
        "framer_buffer: {} bytes",
        mbfirmata_frame::DEFAULT_BUFFER_CAPACITY
    );

    Ok(SUCCESS)
}
