use std::rc::Rc;
use std::time::Duration;

use clap::Parser;

use cn_rs::ctc::CtcAdd;
use cn_rs::interval::Interval;
use cn_rs::network::{Arg, ContractorNetwork, NetworkConfig};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Length of the chain `x[i+1] = x[i] + 1`.
    #[arg(value_name = "INT", default_value = "1000")]
    n: usize,

    /// Time budget of each contraction step (in milliseconds).
    #[clap(long, value_name = "MS", default_value = "1")]
    step: u64,

    /// Fixpoint ratio.
    #[clap(long, value_name = "FLOAT", default_value = "0")]
    ratio: f64,

    /// Write the network graph to this DOT file.
    #[clap(long, value_name = "PATH")]
    dot: Option<String>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let mut cn = ContractorNetwork::with_config(NetworkConfig::default().with_fixedpoint_ratio(args.ratio));
    let add = Rc::new(CtcAdd::new());

    let mut xs = vec![cn.create(Interval::new(0.0, 1.0))];
    for i in 0..args.n {
        let next = cn.create(Interval::all_reals());
        cn.add(&add, [Arg::from(xs[i]), Arg::from(1.0), Arg::from(next)])?;
        xs.push(next);
    }
    println!("Network with {} domains and {} contractors", cn.nb_dom(), cn.nb_ctc());

    // Contract in small steps, the way an online estimator would between two measurements.
    let mut steps = 0;
    loop {
        let report = cn.contract_during(Duration::from_millis(args.step))?;
        steps += 1;
        if !report.suspended() {
            break;
        }
        println!(
            "step {}: {} invocations, {} pending, last = {}",
            steps,
            report.invocations,
            report.pending,
            cn.scalar(xs[args.n])?
        );
    }
    println!("Fixpoint reached after {} steps", steps);
    println!("x[{}] = {}", args.n, cn.scalar(xs[args.n])?);

    if let Some(path) = &args.dot {
        cn.print_dot_graph(path)?;
        println!("Graph written to {}", path);
    }

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
