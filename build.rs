use std::process::Command;

/// Short git revision of the working tree, or `GIT_SHA` when building outside git.
fn git_revision() -> Option<String> {
    let from_git = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .filter(|s| !s.is_empty());

    from_git.or_else(|| std::env::var("GIT_SHA").ok().filter(|s| !s.is_empty()))
}

fn main() {
    let base = env!("CARGO_PKG_VERSION");

    // Kiosk demo builds are tagged so the splash/health output shows which image runs
    let demo_build = std::env::var("SAFRASPHERE_DEMO_BUILD")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let version = match (demo_build, git_revision()) {
        (true, Some(rev)) => format!("{base}-demo+{rev}"),
        (true, None) => format!("{base}-demo"),
        (false, _) => base.to_string(),
    };

    println!("cargo:rustc-env=APP_VERSION={version}");
    println!("cargo:rerun-if-env-changed=SAFRASPHERE_DEMO_BUILD");
    println!("cargo:rerun-if-env-changed=GIT_SHA");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
