use std::rc::Rc;

use cn_rs::ctc::CtcAdd;
use cn_rs::interval::Interval;
use cn_rs::network::ContractorNetwork;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut cn = ContractorNetwork::default();

    let a = cn.create(Interval::new(0.0, 1.0));
    let b = cn.create(Interval::new(-1.0, 1.0));
    let c = cn.create(Interval::new(1.5, 2.0));
    cn.set_name(a, "a")?;
    cn.set_name(b, "b")?;
    cn.set_name(c, "c")?;

    let add = Rc::new(CtcAdd::new());
    let bindings = cn.add(&add, [a, b, c])?;
    cn.set_name(bindings[0], "+")?;
    println!("{}", cn);

    let changed = cn.contract()?;
    println!("changed = {}", changed);
    println!("a = {}", cn.scalar(a)?);
    println!("b = {}", cn.scalar(b)?);
    println!("c = {}", cn.scalar(c)?);

    println!("{}", cn.dump_state());
    println!("{}", cn.to_dot()?);

    Ok(())
}
