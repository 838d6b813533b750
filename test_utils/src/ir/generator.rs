//! Random Clarion source files for property-based testing.
//!
//! `ClarionSource` is a sequence of `Block`s: data declarations, structures
//! with fields, procedures with local data, routines and statements. Blocks
//! nest only through structures, and the depth is bounded so generation stays
//! fast.
//!
//! Identifiers come from a fixed pool that avoids Clarion keywords, types and
//! attributes, so a generated name always lexes as a plain identifier.

use quickcheck::{Arbitrary, Gen};
use std::fmt;

const NAMES: &[&str] = &["Total", "Cust", "Amount", "Counter", "Idx", "Buffer", "Result", "Flag", "Rate", "Qty"];
const TYPES: &[&str] = &["LONG", "SHORT", "BYTE", "REAL", "STRING(20)", "CSTRING(31)", "DECIMAL(7,2)", "DATE"];
const STRUCTURES: &[&str] = &["QUEUE", "GROUP", "RECORD", "CLASS"];
const OPERATORS: &[&str] = &["+", "-", "*", "/"];

const MAX_DEPTH: usize = 3;

#[derive(Clone, Debug)]
pub enum Statement {
    Assign { target: String, source: String, operator: &'static str, number: u32 },
    Call { function: String, argument: String },
    Message { text: String, argument: String },
    If { variable: String, body: Vec<Statement> },
    Loop { body: Vec<Statement> },
    Do { routine: String },
    Comment(String),
    Return,
}

#[derive(Clone, Debug)]
pub enum Block {
    /// `Name TYPE` at column 0
    Data { label: String, data_type: &'static str },
    /// `Name EQUATE(n)`
    Equate { label: String, value: u32 },
    /// `Name QUEUE,PRE(Pfx)` ... `END`
    Structure { label: String, keyword: &'static str, prefix: Option<String>, fields: Vec<Field> },
    Procedure { label: String, parameter: Option<(&'static str, String)>, locals: Vec<Block>, body: Vec<Statement> },
    Routine { label: String, body: Vec<Statement> },
    Include { file: String },
    Comment(String),
}

#[derive(Clone, Debug)]
pub enum Field {
    Simple { label: String, data_type: &'static str },
    Nested(Box<Block>),
}

/// A whole source file
#[derive(Clone, Debug)]
pub struct ClarionSource {
    pub blocks: Vec<Block>,
}

fn name(g: &mut Gen) -> String {
    g.choose(NAMES).unwrap().to_string()
}

fn small(g: &mut Gen) -> u32 {
    u32::arbitrary(g) % 1000
}

fn comment_text(g: &mut Gen) -> String {
    let words: Vec<&str> = (0..usize::arbitrary(g) % 4).map(|_| *g.choose(NAMES).unwrap()).collect();
    words.join(" ")
}

fn gen_statements(g: &mut Gen, depth: usize) -> Vec<Statement> {
    (0..usize::arbitrary(g) % 4).map(|_| gen_statement(g, depth)).collect()
}

fn gen_statement(g: &mut Gen, depth: usize) -> Statement {
    let choices = if depth == 0 { 6 } else { 8 };
    match usize::arbitrary(g) % choices {
        0 => Statement::Assign {
            target: name(g),
            source: name(g),
            operator: *g.choose(OPERATORS).unwrap(),
            number: small(g),
        },
        1 => Statement::Call { function: name(g), argument: name(g) },
        2 => Statement::Message { text: comment_text(g), argument: name(g) },
        3 => Statement::Do { routine: name(g) },
        4 => Statement::Comment(comment_text(g)),
        5 => Statement::Return,
        6 => Statement::If { variable: name(g), body: gen_statements(g, depth - 1) },
        _ => Statement::Loop { body: gen_statements(g, depth - 1) },
    }
}

fn gen_field(g: &mut Gen, depth: usize) -> Field {
    if depth > 0 && usize::arbitrary(g) % 5 == 0 {
        Field::Nested(Box::new(gen_structure(g, depth - 1)))
    } else {
        Field::Simple { label: name(g), data_type: *g.choose(TYPES).unwrap() }
    }
}

fn gen_structure(g: &mut Gen, depth: usize) -> Block {
    Block::Structure {
        label: name(g),
        keyword: *g.choose(STRUCTURES).unwrap(),
        prefix: bool::arbitrary(g).then(|| name(g)[..3].to_string()),
        fields: (0..1 + usize::arbitrary(g) % 4).map(|_| gen_field(g, depth)).collect(),
    }
}

fn gen_block(g: &mut Gen, depth: usize) -> Block {
    match usize::arbitrary(g) % 7 {
        0 => Block::Data { label: name(g), data_type: *g.choose(TYPES).unwrap() },
        1 => Block::Equate { label: name(g), value: small(g) },
        2 => gen_structure(g, depth),
        3 => Block::Procedure {
            label: name(g),
            parameter: bool::arbitrary(g).then(|| (*g.choose(&["LONG", "STRING", "*LONG"]).unwrap(), name(g))),
            locals: (0..usize::arbitrary(g) % 3)
                .map(|_| Block::Data { label: name(g), data_type: *g.choose(TYPES).unwrap() })
                .collect(),
            body: gen_statements(g, depth),
        },
        4 => Block::Routine { label: name(g), body: gen_statements(g, depth) },
        5 => Block::Include { file: format!("{}.inc", name(g)) },
        _ => Block::Comment(comment_text(g)),
    }
}

impl Arbitrary for ClarionSource {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = g.size().min(MAX_DEPTH);
        let count = 1 + usize::arbitrary(g) % 8;
        ClarionSource { blocks: (0..count).map(|_| gen_block(g, depth)).collect() }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let blocks = self.blocks.clone();
        Box::new((0..blocks.len()).map(move |skip| ClarionSource {
            blocks: blocks.iter().enumerate().filter(|(i, _)| *i != skip).map(|(_, b)| b.clone()).collect(),
        }))
    }
}

fn write_statements(f: &mut fmt::Formatter<'_>, statements: &[Statement], indent: usize) -> fmt::Result {
    for statement in statements {
        statement.write(f, indent)?;
    }
    Ok(())
}

impl Statement {
    fn write(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        match self {
            Statement::Assign { target, source, operator, number } => {
                writeln!(f, "{pad}{target} = {source} {operator} {number}")
            }
            Statement::Call { function, argument } => writeln!(f, "{pad}{function}({argument})"),
            Statement::Message { text, argument } => writeln!(f, "{pad}MESSAGE('{text}', {argument})"),
            Statement::If { variable, body } => {
                writeln!(f, "{pad}IF {variable} > 0")?;
                write_statements(f, body, indent + 2)?;
                writeln!(f, "{pad}END")
            }
            Statement::Loop { body } => {
                writeln!(f, "{pad}LOOP")?;
                write_statements(f, body, indent + 2)?;
                writeln!(f, "{pad}END")
            }
            Statement::Do { routine } => writeln!(f, "{pad}DO {routine}"),
            Statement::Comment(text) => writeln!(f, "{pad}! {text}"),
            Statement::Return => writeln!(f, "{pad}RETURN"),
        }
    }
}

impl Block {
    fn write(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        match self {
            Block::Data { label, data_type } => writeln!(f, "{pad}{label} {data_type}"),
            Block::Equate { label, value } => writeln!(f, "{pad}{label} EQUATE({value})"),
            Block::Structure { label, keyword, prefix, fields } => {
                match prefix {
                    Some(prefix) => writeln!(f, "{pad}{label} {keyword},PRE({prefix})")?,
                    None => writeln!(f, "{pad}{label} {keyword}")?,
                }
                for field in fields {
                    match field {
                        Field::Simple { label, data_type } => writeln!(f, "{pad}  {label} {data_type}")?,
                        Field::Nested(block) => block.write(f, indent + 2)?,
                    }
                }
                writeln!(f, "{pad}  END")
            }
            Block::Procedure { label, parameter, locals, body } => {
                match parameter {
                    Some((data_type, name)) => writeln!(f, "{label} PROCEDURE({data_type} {name})")?,
                    None => writeln!(f, "{label} PROCEDURE")?,
                }
                for local in locals {
                    local.write(f, 0)?;
                }
                writeln!(f, "  CODE")?;
                write_statements(f, body, 2)
            }
            Block::Routine { label, body } => {
                writeln!(f, "{label} ROUTINE")?;
                write_statements(f, body, 2)
            }
            Block::Include { file } => writeln!(f, "  INCLUDE('{file}'),ONCE"),
            Block::Comment(text) => writeln!(f, "! {text}"),
        }
    }
}

impl fmt::Display for ClarionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            block.write(f, 0)?;
        }
        Ok(())
    }
}
