//! DIMACS CNF reading and result/model serialization — the loader that sits
//! outside the core, with gzip-compressed input handled transparently via
//! `flate2`.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek, SeekFrom};
use std::{fs, io, path};

use flate2::read::GzDecoder;

use crate::formula::{Lit, Var, VarMap};
use crate::solver::{SolveResult, Solver};

/// Maps the solver's dense internal variable indices back to the DIMACS
/// integer each one was declared under, for writing results and models.
pub type BackwardSubst = VarMap<i32>;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn parse_file<P: AsRef<path::Path>>(path: &P, solver: &mut Solver, strict: bool) -> io::Result<BackwardSubst> {
    let mut file = fs::File::open(path)?;
    let mut magic = [0u8; 2];
    let read = file.read(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    if read == 2 && magic == GZIP_MAGIC {
        parse(&mut GzDecoder::new(file), solver, strict)
    } else {
        parse(&mut file, solver, strict)
    }
}

pub fn parse<R: io::Read>(stream: &mut R, solver: &mut Solver, strict: bool) -> io::Result<BackwardSubst> {
    let mut subst = Subst::new(solver);
    DimacsParser::parse(stream, strict, |cl| subst.add_clause(cl))?;
    Ok(subst.backward_subst)
}

pub fn write_result<W: io::Write>(mut stream: W, result: &SolveResult, backward_subst: &BackwardSubst) -> io::Result<()> {
    match result {
        SolveResult::Sat(model) => {
            writeln!(stream, "s SATISFIABLE")?;
            write_model(&mut stream, backward_subst, model)
        }
        SolveResult::Unsat => writeln!(stream, "s UNSATISFIABLE"),
        SolveResult::Unknown => writeln!(stream, "s UNKNOWN"),
    }
}

/// Writes the `v` line: signed DIMACS integers, positive meaning true,
/// terminated by `0`.
pub fn write_model<W: io::Write>(stream: &mut W, backward_subst: &BackwardSubst, model: &[bool]) -> io::Result<()> {
    write!(stream, "v ")?;
    for i in 0..model.len() {
        if let Some(&id) = backward_subst.get(&Var::from_index(i)) {
            write!(stream, "{} ", if model[i] { id } else { -id })?;
        }
    }
    writeln!(stream, "0")
}

/// Re-reads the original DIMACS file and checks every clause has a true
/// literal under `model` — the self-check used before a SAT result is
/// trusted ("for every original clause C, at least one literal
/// is true under M").
pub fn validate_model_file<P: AsRef<path::Path>>(path: &P, backward_subst: &BackwardSubst, model: &[bool]) -> io::Result<bool> {
    let mut file = fs::File::open(path)?;
    let mut magic = [0u8; 2];
    let read = file.read(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    if read == 2 && magic == GZIP_MAGIC {
        validate_model(&mut GzDecoder::new(file), backward_subst, model)
    } else {
        validate_model(&mut file, backward_subst, model)
    }
}

pub fn validate_model<R: io::Read>(stream: &mut R, backward_subst: &BackwardSubst, model: &[bool]) -> io::Result<bool> {
    let mut true_lits = HashSet::new();
    for i in 0..model.len() {
        if let Some(&id) = backward_subst.get(&Var::from_index(i)) {
            true_lits.insert(if model[i] { id } else { -id });
        }
    }

    let mut ok = true;
    DimacsParser::parse(stream, false, |clause| {
        if !clause.iter().any(|lit| true_lits.contains(lit)) {
            ok = false;
        }
    })?;
    Ok(ok)
}

/// Maps DIMACS integer variable ids to/from the solver's dense `Var`s,
/// creating a fresh `Var` the first time an id is seen.
struct Subst<'s> {
    solver: &'s mut Solver,
    forward_subst: HashMap<i32, Var>,
    backward_subst: BackwardSubst,
}

impl<'s> Subst<'s> {
    fn new(solver: &'s mut Solver) -> Self {
        Subst { solver, forward_subst: HashMap::new(), backward_subst: VarMap::new() }
    }

    fn add_clause(&mut self, raw: Vec<i32>) {
        let lits: Vec<Lit> = raw.iter().map(|&id| self.lit_by_id(id)).collect();
        match self.solver.add_clause(&lits) {
            Ok(()) => {}
            Err(e) => unreachable!("loader only ever creates known variables: {:?}", e),
        }
    }

    fn lit_by_id(&mut self, id: i32) -> Lit {
        let solver = &mut *self.solver;
        let backward_subst = &mut self.backward_subst;
        let var = *self.forward_subst.entry(id.abs()).or_insert_with(|| {
            let v = solver.new_var();
            backward_subst.insert(&v, id.abs());
            v
        });
        var.lit(id > 0)
    }
}

/// A hand-rolled character-at-a-time DIMACS reader, tolerant of arbitrary
/// whitespace between tokens. Reads the whole stream up front to sidestep
/// self-referential iterator lifetimes.
struct DimacsParser {
    chars: Vec<char>,
    pos: usize,
    vars_seen: HashSet<i32>,
    clauses_seen: usize,
}

enum ParseState {
    Waiting,
    Parsing(usize, usize),
}

impl DimacsParser {
    fn parse<R: io::Read, F: FnMut(Vec<i32>)>(stream: &mut R, strict: bool, clause: F) -> io::Result<()> {
        let mut buf = String::new();
        stream.read_to_string(&mut buf)?;

        let mut p = DimacsParser {
            chars: buf.chars().collect(),
            pos: 0,
            vars_seen: HashSet::new(),
            clauses_seen: 0,
        };
        p.run(strict, clause)
    }

    fn run<F: FnMut(Vec<i32>)>(&mut self, strict: bool, mut clause: F) -> io::Result<()> {
        let mut state = ParseState::Waiting;
        loop {
            self.skip_whitespace();
            match state {
                ParseState::Waiting => match self.cur() {
                    Some('c') => self.skip_line(),
                    _ => {
                        self.consume("p cnf")?;
                        let vars = self.next_uint()?;
                        let clauses = self.next_uint()?;
                        state = ParseState::Parsing(vars, clauses);
                    }
                },
                ParseState::Parsing(vars, clauses) => match self.cur() {
                    Some('c') => self.skip_line(),
                    None => {
                        if strict {
                            if clauses != self.clauses_seen {
                                return Err(header_mismatch(format!(
                                    "{} clauses declared, {} found",
                                    clauses, self.clauses_seen
                                )));
                            }
                            if vars < self.vars_seen.len() {
                                return Err(header_mismatch(format!(
                                    "{} vars declared, {} discovered",
                                    vars,
                                    self.vars_seen.len()
                                )));
                            }
                        }
                        return Ok(());
                    }
                    _ => {
                        let c = self.parse_clause()?;
                        clause(c);
                    }
                },
            }
        }
    }

    fn parse_clause(&mut self) -> io::Result<Vec<i32>> {
        let mut lits = Vec::new();
        loop {
            let lit = self.next_int()?;
            if lit == 0 {
                self.clauses_seen += 1;
                return Ok(lits);
            }
            self.vars_seen.insert(lit.abs());
            lits.push(lit);
        }
    }

    #[inline]
    fn cur(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.cur() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        loop {
            match self.cur() {
                None => break,
                Some('\n') => {
                    self.advance();
                    break;
                }
                _ => self.advance(),
            }
        }
    }

    fn consume(&mut self, target: &str) -> io::Result<()> {
        for tc in target.chars() {
            match self.cur() {
                Some(c) if c == tc => self.advance(),
                _ => return Err(io::Error::new(io::ErrorKind::Other, format!("failed to consume; expected '{}'", target))),
            }
        }
        Ok(())
    }

    fn read_uint_body(&mut self) -> io::Result<usize> {
        let mut len = 0usize;
        let mut value = 0usize;
        loop {
            match self.cur().and_then(|c| c.to_digit(10)) {
                Some(d) => {
                    value = value * 10 + (d as usize);
                    len += 1;
                    self.advance();
                }
                _ if len > 0 => return Ok(value),
                _ => return Err(io::Error::new(io::ErrorKind::Other, "integer expected")),
            }
        }
    }

    fn next_int(&mut self) -> io::Result<i32> {
        self.skip_whitespace();
        let sign = match self.cur() {
            Some('+') => {
                self.advance();
                1
            }
            Some('-') => {
                self.advance();
                -1
            }
            _ => 1,
        };
        let val = self.read_uint_body()?;
        Ok(sign * (val as i32))
    }

    fn next_uint(&mut self) -> io::Result<usize> {
        self.skip_whitespace();
        if let Some('+') = self.cur() {
            self.advance();
        }
        self.read_uint_body()
    }
}

fn header_mismatch(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("DIMACS header mismatch: {}", msg))
}
