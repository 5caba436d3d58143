use clap::Parser;
use pingwatch::graph::HourlyCounts;

/// Draw alerts per hour of day from an alert log read on stdin
#[derive(Debug, Clone, Parser)]
struct Args {
    /// Alerts per hour that fill a whole bar, defaults to the busiest hour
    #[arg(short = 'x')]
    max: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let counts = HourlyCounts::read(std::io::stdin().lock())?;
    for row in counts.render(args.max) {
        println!("{row}");
    }

    Ok(())
}
