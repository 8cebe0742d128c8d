use std::env;

use crate::app_info::AppInfo;

pub fn print_version_info(app: AppInfo) {
    let git_hash = option_env!("GIT_HASH").unwrap_or("unknown");
    let rustc_version = option_env!("RUSTC_VERSION").unwrap_or("unknown");

    println!("📦 {} v{}", app.name, app.version);

    if !app.description.is_empty() {
        println!("📝 {}", app.description);
    }

    println!();
    println!("🔨 Build: {git_hash} (rustc {rustc_version})");
    println!("💻 Runtime: {} / {}", env::consts::OS, env::consts::ARCH);
}
