//! Build script: embeds the git hash and checks GPU toolkits.
//!
//! The whisper backend compiles native code when `cuda` or `vulkan` is on;
//! a missing toolkit fails here with a readable message instead of deep
//! inside whisper-rs-sys.

use std::process::Command;

fn main() {
    // Embed git short hash for version string
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    if cfg!(feature = "cuda") {
        check_cuda();
    }
    if cfg!(feature = "vulkan") {
        check_vulkan();
    }
}

fn check_cuda() {
    match Command::new("nvcc").arg("--version").output() {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout);
            match parse_cuda_version(&text) {
                Some((major, minor)) => {
                    println!("cargo::warning=CUDA {}.{} toolkit detected", major, minor)
                }
                None => println!("cargo::warning=CUDA toolkit detected (version unknown)"),
            }
        }
        _ => panic!(
            "\n\n`nvcc` not found: CUDA toolkit is not installed.\n\
             Install: https://developer.nvidia.com/cuda-downloads\n\
             Or build without CUDA: cargo build --release\n"
        ),
    }
}

/// Parse "release X.Y" from nvcc --version output.
fn parse_cuda_version(text: &str) -> Option<(u32, u32)> {
    // nvcc output: "Cuda compilation tools, release 12.4, V12.4.131"
    let release_pos = text.find("release ")?;
    let after = &text[release_pos + 8..];
    let comma = after.find(',')?;
    let mut parts = after[..comma].split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

fn check_vulkan() {
    if Command::new("vulkaninfo")
        .arg("--summary")
        .output()
        .is_err()
    {
        panic!(
            "\n\n`vulkaninfo` not found: Vulkan SDK is not installed.\n\
             Install: https://vulkan.lunarg.com/\n\
             Or build without Vulkan: cargo build --release\n"
        );
    }
    println!("cargo::warning=Vulkan SDK detected");
}
