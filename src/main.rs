use colored::Colorize;

fn main() {
    if let Err(err) = imagony::run() {
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}
