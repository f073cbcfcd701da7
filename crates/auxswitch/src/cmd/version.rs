use auxswitch_backend::vendor::standard_backends;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("auxswitch {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let backends: Vec<&str> = standard_backends().iter().map(|b| b.id()).collect();
    println!("name: auxswitch");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("AUXSWITCH_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("features: async={}, cli=true", cfg!(feature = "async"));
    println!("backends: {}", backends.join(", "));

    Ok(SUCCESS)
}
