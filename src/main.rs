use pacelens_lib::stages;
use std::path::Path;

const USAGE: &str = "usage: pacelens [extract | code-size | compile | report | all]";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let stage = args.get(1).map(String::as_str).unwrap_or("all");

    if let Err(e) = run_stage(stage) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run_stage(stage: &str) -> Result<(), String> {
    let config = stages::config::load_config(Path::new("."))?;

    match stage {
        "extract" => stages::extract::run(&config),
        "code-size" => stages::code_size::run(&config),
        "compile" => stages::compile::run(&config),
        "report" => stages::report::run(&config),
        "all" => {
            stages::extract::run(&config)?;
            stages::code_size::run(&config)?;
            stages::compile::run(&config)?;
            stages::report::run(&config)
        }
        other => Err(format!("Unknown stage '{other}'. {USAGE}")),
    }
}
