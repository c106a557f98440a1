//! This module contains all the code for reading the input of `maaf` and writing the result of
//! the computation back to screen or to a file.

use crate::app::Report;
use crate::error::Result;
use crate::forest::Mode;
use crate::newick;
use crate::parallel::Outcome;
use crate::tree::{Taxa, Tree, TreeBuilder};
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read, Write};

/// Read the input from a file
pub fn read_input(file_name: &str) -> Result<(Taxa, Vec<Tree>)> {
    let mut newick = String::from("");
    fs::File::open(file_name)?.read_to_string(&mut newick)?;
    let mut builder = TreeBuilder::new();
    newick::parse_forest(&mut builder, &newick)?;
    Ok(builder.finish())
}

/// Write the result to a file or stdout
pub fn write_output(file_name: Option<&str>, report: &Report) -> Result<()> {
    let mut file: Box<dyn io::Write> = match file_name {
        Some(file_name) => Box::new(fs::File::create(file_name)?),
        None            => Box::new(io::stdout()),
    };
    let output = format_output(report);
    write!(file, "{}", output)?;
    Ok(())
}

/// Format the distance, followed by the forests and, in network mode, the networks
pub fn format_output(report: &Report) -> String {
    let quantity = match report.mode {
        Mode::RsprDistance => "rSPR distance",
        _                  => "hybridization number",
    };

    let mut output = String::new();
    match &report.outcome {
        Outcome::Exact { size, .. } => {
            writeln!(&mut output, "{}: {}", quantity, size - 1).unwrap();
        },
        Outcome::Bounded { lower_bound, best } => {
            let lower = lower_bound.saturating_sub(1);
            match best {
                Some((size, _)) => writeln!(
                    &mut output, "{}: between {} and {} (time limit reached)",
                    quantity, lower, size - 1),
                None => writeln!(
                    &mut output, "{}: at least {} (time limit reached)", quantity, lower),
            }.unwrap();
        },
    }

    let root_taxon = report.taxa.root_taxon();
    let mut taxa   = report.taxa.all();
    taxa.remove(root_taxon);
    for (i, forest) in report.outcome.forests().iter().enumerate() {
        let fragments = forest.fragments().iter()
            .map(|fragment| fragment.restrict(&taxa))
            .filter(|fragment| !fragment.is_empty())
            .collect::<Vec<Tree>>();
        writeln!(&mut output, "forest {}:", i + 1).unwrap();
        output.push_str(&newick::format_forest(&fragments, |t| report.leaf_label(t)));
    }

    for (i, network) in report.outcome.networks().iter().enumerate() {
        if let Some(text) = newick::format_network(network, |t| report.leaf_label(t)) {
            writeln!(&mut output, "network {}:\n{}", i + 1, text).unwrap();
        }
    }
    output
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::app::{compute, Config};

    /// Compute a report for two trees
    fn report(newick: &str, mode: Mode) -> Report {
        let mut builder = TreeBuilder::new();
        newick::parse_forest(&mut builder, newick).unwrap();
        let (taxa, trees) = builder.finish();
        let mut cfg = Config::from_args(vec!["maaf", "unused.nwk"]);
        cfg.mode = mode;
        compute(&cfg, taxa, trees).unwrap()
    }

    /// The distance comes first, then one forest without the outgroup
    #[test]
    fn forest_output() {
        let output = format_output(&report("(((a,b),c),d);\n((a,(b,c)),d);\n", Mode::RsprDistance));
        let lines  = output.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "rSPR distance: 1");
        assert_eq!(lines[1], "forest 1:");
        assert_eq!(lines.len(), 4);
        assert!(!output.contains("rho"));
    }

    /// Networks are printed in extended Newick format
    #[test]
    fn network_output() {
        let output = format_output(&report("(((a,b),c),d);\n((a,(b,c)),d);\n", Mode::Network));
        assert!(output.starts_with("hybridization number: 1\n"));
        assert!(output.contains("network 1:"));
        assert!(output.contains("#H1"));
    }

    /// Identical trees give one forest consisting of the whole tree
    #[test]
    fn identical_output() {
        let output = format_output(&report("((a,b),c);\n((a,b),c);\n", Mode::HybridNumber));
        assert_eq!(output, "hybridization number: 0\nforest 1:\n((a,b),c);\n");
    }

    /// A search stopped by the time limit reports the range the distance lies in
    #[test]
    fn bounded_output() {
        let mut report = report("(((a,b),c),d);\n((a,(b,c)),d);\n", Mode::HybridNumber);
        let forests    = report.outcome.forests().to_vec();
        report.outcome = Outcome::Bounded { lower_bound: 1, best: None };
        assert_eq!(format_output(&report), "hybridization number: at least 0 (time limit reached)\n");
        report.outcome = Outcome::Bounded { lower_bound: 1, best: Some((2, forests)) };
        let output = format_output(&report);
        assert!(output.starts_with(
            "hybridization number: between 0 and 1 (time limit reached)\nforest 1:\n"));
    }
}
