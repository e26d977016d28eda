use serde::Serialize;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    target_os: &'static str,
    target_arch: &'static str,
    git_hash: &'static str,
    features: Vec<&'static str>,
}

impl BuildInfo {
    fn current() -> Self {
        let mut features = vec!["cli"];
        for (name, enabled) in [
            ("session", cfg!(feature = "session")),
            ("async", cfg!(feature = "async")),
            ("ws", cfg!(feature = "ws")),
        ] {
            if enabled {
                features.push(name);
            }
        }

        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            target_os: std::env::consts::OS,
            target_arch: std::env::consts::ARCH,
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            features,
        }
    }
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    let info = BuildInfo::current();

    match (args.extended, format) {
        (_, OutputFormat::Json) => println!(
            "{}",
            serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
        ),
        (false, _) => println!("{} {}", info.name, info.version),
        (true, _) => {
            println!("name: {}", info.name);
            println!("version: {}", info.version);
            println!("target: {}-{}", info.target_arch, info.target_os);
            println!("git_hash: {}", info.git_hash);
            println!("features: {}", info.features.join(","));
        }
    }

    Ok(SUCCESS)
}
