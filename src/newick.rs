//! A module to parse Newick strings into trees and to convert trees, forests, and networks back to
//! Newick strings.
//!
//! # Parsing
//!
//! The two parsing functions are `parse_tree()` and `parse_forest()`.  For `parse_tree()`, the
//! input has to consist of a single line that is a valid Newick string representing a single
//! tree.  For `parse_forest()`, the input is a multi-line text.  Each non-blank line encodes one
//! tree.
//!
//! Both functions take a mutable reference to a `tree::TreeBuilder` as their first argument.  The
//! builder constructs the trees based on the methods the parser calls and rejects nodes with more
//! than two children as well as duplicate or reserved leaf labels.
//!
//! The grammar for a Newick string used by the parser is the following:
//!
//! ```ignore
//! Newick     -> Tree ;
//! Tree       -> Subtree Label : EdgeLength
//! Label      -> string | Nothing
//! EdgeLength -> number | Nothing
//! Subtree    -> ( Trees ) | Nothing
//! Trees      -> Tree MoreTrees
//! MoreTrees  -> , Trees | Nothing
//! Nothing    ->
//! ```
//!
//! Labels of internal nodes and edge lengths are accepted but ignored.
//!
//! # Formatting
//!
//! `format_tree()` and `format_forest()` turn trees whose leaves are labelled with taxon IDs back
//! into Newick strings.  The caller supplies the function that turns a leaf label into text, which
//! is how reduced subtrees get expanded on output.  `format_network()` produces extended Newick,
//! where each reticulation is tagged `#H<i>`.

use crate::network::{Network, NetNode};
use crate::tree::{BuildError, Node, Tree, TreeBuilder};
use std::collections::HashSet;
use std::fmt;
use std::iter;
use std::result;
use std::str;
use thiserror::Error;

/// The parser's result type
pub type Result<T> = result::Result<T, Error>;

/// The error raised when a parse error is encountered
#[derive(Debug, Error)]
#[error("{message} at position {pos}")]
pub struct Error {

    /// The error message
    message: String,

    /// The position in the input text where the error occurred
    pos: Pos,
}

impl Error {

    /// The position (line, column) where the error occurred
    pub fn position(&self) -> (usize, usize) {
        (self.pos.0, self.pos.1)
    }
}

/// Representation of an input position
#[derive(Clone, Copy, Debug)]
struct Pos(usize, usize);

/// Parse a given one-line Newick string using the given tree builder
///
/// # Example
///
/// ```
/// # use agreement_forest::tree::TreeBuilder;
/// # use agreement_forest::newick::*;
/// let newick      = "((a,(b,(c,d))),e);";
/// let mut builder = TreeBuilder::new();
/// parse_tree(&mut builder, newick).unwrap();
/// let (taxa, trees) = builder.finish();
/// assert_eq!(format_tree(&trees[0], |t| taxa.label(t).to_string()).unwrap(), newick);
/// ```
pub fn parse_tree(builder: &mut TreeBuilder, newick: &str) -> Result<()> {
    Parser::new(builder, newick).parse_tree()
}

/// Parse a given multi-line Newick string using the given tree builder
pub fn parse_forest(builder: &mut TreeBuilder, newick: &str) -> Result<()> {
    Parser::new(builder, newick).parse_forest()
}

/// Struct representing the state of the Newick parser
struct Parser<'b, 'i> {

    /// The builder used to build the tree
    builder: &'b mut TreeBuilder,

    /// The current input position
    pos: Pos,

    /// The iterator currently used
    chars: iter::Peekable<str::Chars<'i>>,
}

impl<'b, 'i> Parser<'b, 'i> {

    /// Create a new parser that parses the given Newick string and uses the given builder to
    /// construct the corresponding tree.
    fn new(builder: &'b mut TreeBuilder, newick: &'i str) -> Parser<'b, 'i> {
        Parser {
            builder,
            pos:   Pos(1, 1),
            chars: newick.chars().peekable()
        }
    }

    /// Parse a tree from a one-line Newick string
    fn parse_tree(mut self) -> Result<()> {
        self.parse_one_tree()?;
        match self.chars.peek() {
            None => Ok(()),
            _    => Self::error("expected a one-line input", self.pos),
        }
    }

    /// Parse a forest from a multi-line Newick string, skipping blank lines
    fn parse_forest(mut self) -> Result<()> {
        loop {
            self.skip_spaces();
            match self.chars.peek() {
                None       => return Ok(()),
                Some('\n') => { self.next(); },
                _          => self.parse_one_tree()?,
            }
        }
    }

    /// Parse one tree terminated by a semicolon and the end of the line
    fn parse_one_tree(&mut self) -> Result<()> {
        self.builder.new_tree();
        let root = self.parse_subtree()?;
        self.skip_spaces();
        self.parse_symbol(';')?;
        self.skip_spaces();
        self.parse_eol()?;
        self.builder.finish_tree(root);
        Ok(())
    }

    /// Consume the next character, keeping track of the input position
    fn next(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.pos = Pos(self.pos.0 + 1, 1);
        } else {
            self.pos.1 += 1;
        }
        Some(c)
    }

    /// Check that we're at the end of the line
    fn parse_eol(&mut self) -> Result<()> {
        let pos = self.pos;
        match self.next() {
            None | Some('\n') => Ok(()),
            _                 => Self::error("expected end of line", pos),
        }
    }

    /// Parse the given symbol
    fn parse_symbol(&mut self, sym: char) -> Result<()> {
        let pos = self.pos;
        match self.next() {
            Some(c) if c == sym => Ok(()),
            _                   => Self::error(&format!("expected `{}'", sym), pos),
        }
    }

    /// Skip over spaces, but not over the end of the line
    fn skip_spaces(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' || !c.is_whitespace() {
                return;
            }
            self.next();
        }
    }

    /// Parse one subtree
    fn parse_subtree(&mut self) -> Result<Node> {
        self.skip_spaces();
        let pos = self.pos;
        match self.chars.peek() {

            Some('(') => {
                self.next();
                let children = self.parse_subtrees()?;
                self.parse_symbol(')')?;
                self.parse_label()?;
                self.skip_edge_length()?;
                self.builder.new_node(children).or_else(|err| Self::build_error(err, pos))
            },

            _ => {
                let label = self.parse_label()?;
                self.skip_edge_length()?;
                self.builder.new_leaf(label).or_else(|err| Self::build_error(err, pos))
            },
        }
    }

    /// Parse a list of subtrees
    fn parse_subtrees(&mut self) -> Result<Vec<Node>> {
        let mut nodes = vec![self.parse_subtree()?];
        loop {
            self.skip_spaces();
            match self.chars.peek() {
                Some(',') => {
                    self.next();
                    nodes.push(self.parse_subtree()?);
                },
                _ => break,
            };
        }
        Ok(nodes)
    }

    /// Skip edge lengths
    fn skip_edge_length(&mut self) -> Result<()> {
        self.skip_spaces();
        match self.chars.peek() {
            Some(':') => { self.next(); },
            _         => return Ok(()),
        }
        while let Some(&c) = self.chars.peek() {
            match c {
                ',' | ';' | ':' | '(' | ')' | '\n' => break,
                _                                  => { self.next(); },
            }
        }
        Ok(())
    }

    /// Parse a node label
    fn parse_label(&mut self) -> Result<String> {
        let mut label = String::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                ',' | ';' | ':' | '(' | ')' | '\n' => break,
                _                                  => {
                    label.push(c);
                    self.next();
                },
            }
        }
        Ok(label.trim().to_string())
    }

    /// Report an error at the given position
    fn error<T>(message: &str, pos: Pos) -> Result<T> {
        Err(Error {
            message: message.to_string(),
            pos,
        })
    }

    /// Report a tree construction error at the given position
    fn build_error<T>(err: BuildError, pos: Pos) -> Result<T> {
        Self::error(&err.to_string(), pos)
    }
}

/// Format a tree into a Newick string, using `leaf_label` to turn leaf labels into text
///
/// # Example
///
/// ```
/// # use agreement_forest::tree::TreeBuilder;
/// # use agreement_forest::newick::*;
/// let mut builder = TreeBuilder::new();
/// parse_tree(&mut builder, "(b:1.5,(c,a)x);").unwrap();
/// let (taxa, trees) = builder.finish();
/// assert_eq!(format_tree(&trees[0], |t| taxa.label(t).to_string()).unwrap(), "(b,(c,a));");
/// ```
pub fn format_tree<L: Fn(usize) -> String>(tree: &Tree, leaf_label: L) -> Option<String> {
    let mut newick = TreeFormatter { tree, leaf_label: &leaf_label }.subtree(tree.root()?)?;
    newick.push(';');
    Some(newick)
}

/// Format a forest into a Newick string, one line per tree.  Empty trees are skipped.
pub fn format_forest<L: Fn(usize) -> String>(forest: &[Tree], leaf_label: L) -> String {
    let mut newick = String::new();
    for tree in forest {
        if let Some(tree) = format_tree(tree, &leaf_label) {
            newick.push_str(&tree);
            newick.push('\n');
        }
    }
    newick
}

/// The subtree of `node` without the terminating semicolon
pub fn format_subtree<L: Fn(usize) -> String>(tree: &Tree, node: Node, leaf_label: L)
    -> Option<String> {
    TreeFormatter { tree, leaf_label: &leaf_label }.subtree(node)
}

/// Format a network into an extended Newick string.  The first visit of a reticulation writes its
/// subtree followed by its `#H<i>` tag, later visits write only the tag.
pub fn format_network<L: Fn(usize) -> String>(network: &Network, leaf_label: L) -> Option<String> {
    let mut formatter = NetworkFormatter {
        network,
        leaf_label: &leaf_label,
        visited:    HashSet::new(),
    };
    let mut newick = formatter.subtree(network.root()?)?;
    newick.push(';');
    Some(newick)
}

/// The state of the tree formatting process
struct TreeFormatter<'a, L> {

    /// The tree being formatted
    tree: &'a Tree,

    /// Text for leaf labels
    leaf_label: &'a L,
}

impl<'a, L: Fn(usize) -> String> TreeFormatter<'a, L> {

    /// Format the subtree rooted in `node`
    fn subtree(&self, node: Node) -> Option<String> {
        match self.tree.children(node) {
            Some((l, r)) => Some(format!("({},{})", self.subtree(l)?, self.subtree(r)?)),
            None         => Some((self.leaf_label)(self.tree.label(node)?)),
        }
    }
}

/// The state of the network formatting process
struct NetworkFormatter<'a, L> {

    /// The network being formatted
    network: &'a Network,

    /// Text for leaf labels
    leaf_label: &'a L,

    /// Reticulations whose subtree has been written already
    visited: HashSet<NetNode>,
}

impl<'a, L: Fn(usize) -> String> NetworkFormatter<'a, L> {

    /// Format the sub-network reachable from `node`
    fn subtree(&mut self, node: NetNode) -> Option<String> {
        let tag = self.network.reticulation_index(node).map(|i| format!("#H{}", i));
        if let Some(tag) = &tag {
            if !self.visited.insert(node) {
                return Some(tag.clone());
            }
        }
        let children = self.network.children(node);
        let mut newick = match self.network.label(node) {
            Some(label) if children.is_empty() => (self.leaf_label)(label),
            _                                  => {
                let mut parts = vec![];
                for child in children {
                    parts.push(self.subtree(child)?);
                }
                format!("({})", parts.join(","))
            },
        };
        if let Some(tag) = tag {
            newick.push_str(&tag);
        }
        Some(newick)
    }
}

impl fmt::Display for Pos {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}
