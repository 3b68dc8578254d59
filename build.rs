use std::{fs, path::Path, process::Command};

fn main() {
  println!("cargo:rerun-if-changed=.git/HEAD");
  if Path::new(".git/refs/heads").exists() {
    println!("cargo:rerun-if-changed=.git/refs/heads");
  }

  let git_info = get_git_info();

  println!("cargo:rustc-env=GIT_BRANCH={}", git_info.branch);
  println!("cargo:rustc-env=GIT_COMMIT_SHORT={}", git_info.commit_short);
  println!("cargo:rustc-env=GIT_COMMIT_TIME={}", git_info.commit_time);
}

struct GitInfo {
  branch: String,
  commit_short: String,
  commit_time: String,
}

fn git(args: &[&str]) -> Option<String> {
  let output = Command::new("git").args(args).output().ok()?;
  if !output.status.success() {
    return None;
  }
  let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
  (!value.is_empty()).then_some(value)
}

fn get_git_info() -> GitInfo {
  let mut info = GitInfo {
    branch: git(&["rev-parse", "--abbrev-ref", "HEAD"]).unwrap_or_else(|| "unknown".into()),
    commit_short: git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into()),
    commit_time: git(&["show", "-s", "--format=%cI", "HEAD"]).unwrap_or_else(|| "unknown".into()),
  };

  // No git binary: read the ref straight from .git
  if info.commit_short == "unknown" {
    if let Ok(head) = fs::read_to_string(".git/HEAD") {
      if let Some(ref_path) = head.strip_prefix("ref: ") {
        let ref_path = ref_path.trim();
        info.branch = ref_path.rsplit('/').next().unwrap_or("unknown").to_string();
        if let Ok(commit) = fs::read_to_string(format!(".git/{}", ref_path)) {
          info.commit_short = commit.trim().chars().take(7).collect();
        }
      } else {
        info.commit_short = head.trim().chars().take(7).collect();
      }
    }
  }

  info
}
