#[macro_use]
extern crate log;
use time;

use std::{fs, io, path};

pub mod dimacs;
pub mod formula;
pub mod solver;
pub(crate) mod util;

pub use solver::{Config, SolveResult, SolverError, Stats};

use solver::budget::Budget;
use solver::Solver;

/// Top-level driver options — the CLI's view of a run (is the
/// library surface; this is the thin shell `main.rs` builds on top of it).
pub struct MainOptions {
    /// Reject input whose `p cnf` header disagrees with the clauses found.
    pub strict: bool,
    /// `false` only reports the clause count after parsing and preprocessing.
    pub solve: bool,
    pub in_path: path::PathBuf,
    pub out_path: Option<path::PathBuf>,
}

/// Parse `options.in_path`, run the solver to a verdict (or to budget
/// exhaustion), self-check any SAT model against the original clauses, and
/// optionally write the result in DIMACS form.
pub fn solve(options: MainOptions, config: Config) -> io::Result<()> {
    let mut solver = Solver::new(config).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{:?}", e)))?;

    info!("============================[ Problem Statistics ]=============================");
    info!("|                                                                             |");

    let initial_time = time::precise_time_s();
    let backward_subst = dimacs::parse_file(&options.in_path, &mut solver, options.strict)?;
    let parse_end_time = time::precise_time_s();

    info!("|  Number of variables:  {:12}                                         |", solver.num_vars());
    info!("|  Number of clauses:    {:12}                                         |", solver.num_clauses());
    info!(
        "|  Parse time:           {:12.2} s                                       |",
        parse_end_time - initial_time
    );
    info!("|                                                                             |");

    let budget = Budget::unbounded();
    let result = if options.solve {
        solver.solve(&budget)
    } else {
        info!("===============================================================================");
        SolveResult::Unknown
    };

    let cpu_time = time::precise_time_s() - initial_time;
    let mem_used = util::mem_used_peak();
    let stats = solver.stats();
    print_stats(&stats, cpu_time, mem_used);

    match &result {
        SolveResult::Unsat => println!("UNSATISFIABLE"),
        SolveResult::Unknown => println!("INDETERMINATE"),
        SolveResult::Sat(model) => {
            println!("SATISFIABLE");
            assert!(
                dimacs::validate_model_file(&options.in_path, &backward_subst, model)?,
                "SELF-CHECK FAILED"
            );
        }
    }

    if let Some(path) = options.out_path {
        dimacs::write_result(fs::File::create(path)?, &result, &backward_subst)?;
    }

    Ok(())
}

fn print_stats(stats: &Stats, cpu_time: f64, mem_used: Option<usize>) {
    info!("restarts              : {:<12}", stats.restarts);

    {
        let confl_per_s = (stats.conflicts as f64) / cpu_time;
        info!("conflicts             : {:<12}   ({:.0} /sec)", stats.conflicts, confl_per_s);
    }

    {
        let rnd_percent = (stats.rnd_decisions as f64) * 100.0 / (stats.decisions.max(1) as f64);
        let decisions_per_s = (stats.decisions as f64) / cpu_time;
        info!(
            "decisions             : {:<12}   ({:4.2} % random) ({:.0} /sec)",
            stats.decisions, rnd_percent, decisions_per_s
        );
    }

    {
        let props_per_s = (stats.propagations as f64) / cpu_time;
        info!("propagations          : {:<12}   ({:.0} /sec)", stats.propagations, props_per_s);
    }

    {
        let del_percent = (stats.del_literals as f64) * 100.0 / ((stats.del_literals + stats.tot_literals).max(1) as f64);
        info!("conflict literals     : {:<12}   ({:4.2} % deleted)", stats.tot_literals, del_percent);
    }

    if let Some(mem_used) = mem_used {
        info!("Memory used           : {:.2} MB", (mem_used as f64) / 1024.0);
    }
    info!("CPU time              : {} s", cpu_time);
    info!("");
}
