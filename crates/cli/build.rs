use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("readmode")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fetch a readable article from any URL")
        .arg(clap::arg!([URL] "Article URL (http or https)"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (markdown, html, text, json)")
                .default_value("markdown")
                .value_parser(["markdown", "html", "text", "json"]),
        )
        .arg(clap::arg!(--references "Include reference table with all links (Markdown only)"))
        .arg(clap::arg!(--frontmatter "Include TOML frontmatter (Markdown only)"))
        .arg(clap::arg!(--timeout <SECS> "Overall time budget in seconds").default_value("45"))
        .arg(clap::arg!(--strategies <LIST> "Retrieval strategies in order"))
        .arg(clap::arg!(--extractors <LIST> "Extraction strategies in order"))
        .arg(clap::arg!(--"reader-proxy" <TEMPLATE> "Reader service endpoint template"))
        .arg(clap::arg!(--"web-proxy" <TEMPLATE> "Web proxy endpoint template"))
        .arg(clap::arg!(--"archive-api" <TEMPLATE> "Archive availability API template"))
        .arg(clap::arg!(--"no-degraded" "Fail instead of accepting below-threshold readability output"))
        .arg(clap::arg!(--"no-images" "Strip images from output"))
        .arg(clap::arg!(-v --verbose "Print attempted strategies and enable debug logging"))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_parser(["bash", "zsh", "fish", "powershell"]),
        );

    for shell in [
        clap_complete::shells::Shell::Bash,
        clap_complete::shells::Shell::Zsh,
        clap_complete::shells::Shell::Fish,
        clap_complete::shells::Shell::PowerShell,
    ] {
        clap_complete::generate_to(shell, &mut cmd, "readmode", &completions_dir).unwrap();
    }

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
