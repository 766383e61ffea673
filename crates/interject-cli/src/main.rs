use clap::Parser;
use interject_cli::{CliArgs, InterjectCli};

fn main() {
    let args = CliArgs::parse();
    let result = InterjectCli::from_args("interject", &args).and_then(|cli| cli.run(args));
    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
