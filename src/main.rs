#[macro_use]
extern crate clap;

use std::path;

use cdcl_sat::solver::conflict::CcMinMode;
use cdcl_sat::solver::restart::RestartStrategy;
use cdcl_sat::{Config, MainOptions};

fn main() {
    let ls012 = ["0", "1", "2"];
    let matches = clap::App::new("cdcl-sat")
        .version(&crate_version!()[..])
        .about("CDCL SAT solver")
        .arg(
            clap::Arg::with_name("verb")
                .long("verb")
                .takes_value(true)
                .possible_values(&ls012)
                .help("Verbosity level (0=silent, 1=some, 2=more)"),
        )
        .arg(clap::Arg::with_name("strict").long("strict").help("Validate the DIMACS header during parsing"))
        .arg(clap::Arg::with_name("no-solve").long("no-solve").help("Stop after parsing and preprocessing"))
        .arg(clap::Arg::with_name("input").required(true))
        .arg(clap::Arg::with_name("output").required(false))
        .arg(clap::Arg::with_name("vsids-decay").long("vsids-decay").takes_value(true).help("The variable activity decay factor"))
        .arg(clap::Arg::with_name("clause-decay").long("clause-decay").takes_value(true).help("The clause activity decay factor"))
        .arg(clap::Arg::with_name("rnd-freq").long("rnd-freq").takes_value(true).help("Random-phase probability once adaptivity latches on"))
        .arg(clap::Arg::with_name("rnd-seed").long("rnd-seed").takes_value(true).help("Seed for the random-phase/random-decision generator"))
        .arg(clap::Arg::with_name("no-adaptive-rnd-phase").long("no-adaptive-rnd-phase").help("Apply rnd-freq from the start instead of latching it on"))
        .arg(clap::Arg::with_name("ccmin-mode").long("ccmin-mode").takes_value(true).possible_values(&ls012).help("Conflict clause minimization (0=none, 1=basic, 2=deep)"))
        .arg(clap::Arg::with_name("restart").long("restart").takes_value(true).possible_values(&["luby", "glucose"]).help("Restart strategy"))
        .arg(clap::Arg::with_name("no-restart-postponing").long("no-restart-postponing").help("Disable restart postponing on a growing trail"))
        .arg(clap::Arg::with_name("rfirst").long("rfirst").takes_value(true).help("Base restart interval"))
        .arg(clap::Arg::with_name("glucose-window").long("glucose-window").takes_value(true).help("Glucose fast-average window size"))
        .arg(clap::Arg::with_name("glucose-k").long("glucose-k").takes_value(true).help("Glucose restart threshold K"))
        .arg(clap::Arg::with_name("learnts-base").long("learnts-base").takes_value(true).help("Initial learned-clause limit"))
        .arg(clap::Arg::with_name("learnts-growth").long("learnts-growth").takes_value(true).help("Learned-clause limit growth factor per reduction"))
        .arg(clap::Arg::with_name("no-inprocess").long("no-inprocess").help("Disable subsumption/self-subsuming-resolution inprocessing"))
        .arg(clap::Arg::with_name("inprocess-interval").long("inprocess-interval").takes_value(true).help("Conflicts between inprocessing passes"))
        .get_matches();

    {
        let mut builder = env_logger::Builder::new();
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "{}", record.args())
        });
        builder.filter(
            None,
            match matches.value_of("verb") {
                Some("1") => log::LevelFilter::Info,
                Some("2") => log::LevelFilter::Trace,
                Some("0") => log::LevelFilter::Off,
                _ => log::LevelFilter::Info,
            },
        );
        builder.init();
    }

    let mut config = Config::default();

    if let Some(x) = matches.value_of("vsids-decay").and_then(|s| s.parse().ok()) {
        if x > 0.0 && x <= 1.0 {
            config.vsids_decay = x;
        }
    }

    if let Some(x) = matches.value_of("clause-decay").and_then(|s| s.parse().ok()) {
        if x > 0.0 && x <= 1.0 {
            config.clause_decay = x;
        }
    }

    if let Some(x) = matches.value_of("rnd-freq").and_then(|s| s.parse().ok()) {
        if (0.0..=1.0).contains(&x) {
            config.random_phase_prob = x;
        }
    }

    if let Some(x) = matches.value_of("rnd-seed").and_then(|s| s.parse().ok()) {
        config.random_seed = x;
    }

    if matches.is_present("no-adaptive-rnd-phase") {
        config.adaptive_random_phase = false;
    }

    if let Some(x) = matches.value_of("ccmin-mode") {
        config.ccmin_mode = match x {
            "0" => CcMinMode::None,
            "1" => CcMinMode::Basic,
            _ => CcMinMode::Deep,
        };
    }

    if let Some(x) = matches.value_of("restart") {
        config.restart_strategy = match x {
            "luby" => RestartStrategy::Luby,
            _ => RestartStrategy::Glucose,
        };
    }

    if matches.is_present("no-restart-postponing") {
        config.restart_postponing = false;
    }

    if let Some(x) = matches.value_of("rfirst").and_then(|s| s.parse().ok()) {
        if x > 0 {
            config.restart_base = x;
        }
    }

    if let Some(x) = matches.value_of("glucose-window").and_then(|s| s.parse().ok()) {
        if x > 0 {
            config.glucose_window = x;
        }
    }

    if let Some(x) = matches.value_of("glucose-k").and_then(|s| s.parse().ok()) {
        if x > 0.0 {
            config.glucose_k = x;
        }
    }

    if let Some(x) = matches.value_of("learnts-base").and_then(|s| s.parse().ok()) {
        config.learned_clause_limit_base = x;
    }

    if let Some(x) = matches.value_of("learnts-growth").and_then(|s| s.parse().ok()) {
        if x > 1.0 {
            config.learned_clause_limit_growth = x;
        }
    }

    if matches.is_present("no-inprocess") {
        config.inprocessing_interval = None;
    } else if let Some(x) = matches.value_of("inprocess-interval").and_then(|s| s.parse().ok()) {
        config.inprocessing_interval = Some(x);
    }

    let options = MainOptions {
        strict: matches.is_present("strict"),
        solve: !matches.is_present("no-solve"),
        in_path: path::PathBuf::from(matches.value_of("input").unwrap()),
        out_path: matches.value_of("output").map(path::PathBuf::from),
    };

    cdcl_sat::solve(options, config).expect("Error");
}
