const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

macro_rules! env_or {
    ($key:literal, $default:literal) => {
        option_env!($key).unwrap_or($default)
    };
}

pub struct BannerInfo {
    pub version: &'static str,
    pub branch: &'static str,
    pub commit_short: &'static str,
    pub commit_time: &'static str,
    pub profile: &'static str,
}

impl Default for BannerInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            branch: env_or!("GIT_BRANCH", "unknown"),
            commit_short: env_or!("GIT_COMMIT_SHORT", "unknown"),
            commit_time: env_or!("GIT_COMMIT_TIME", "unknown"),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        }
    }
}

pub fn print_banner(info: &BannerInfo, address: &str) {
    println!();
    println!("{GREEN}                  __          __          __  {RESET}");
    println!("{GREEN}   ____ ___  ___  / /___  ____/ /__  _____/ /__{RESET}");
    println!("{GREEN}  / __ `__ \\/ _ \\/ / __ \\/ __  / _ \\/ ___/ //_/{RESET}");
    println!("{GREEN} / / / / / /  __/ / /_/ / /_/ /  __/ /__/ ,<   {RESET}");
    println!("{GREEN}/_/ /_/ /_/\\___/_/\\____/\\__,_/\\___/\\___/_/|_|  {RESET}");
    println!("{DIM}================================================{RESET}");
    println!();

    print_row("Version", info.version, CYAN);
    print_row("Branch", info.branch, RESET);
    print_row("Commit", info.commit_short, RESET);
    print_row("Commit time", info.commit_time, RESET);
    print_row("Profile", info.profile, YELLOW);
    println!("  {BOLD}{:<14}{RESET}{}", "Listening", address);
    println!();
}

fn print_row(label: &str, value: &'static str, color: &str) {
    println!("  {BOLD}{label:<14}{RESET}{color}{value}{RESET}");
}
