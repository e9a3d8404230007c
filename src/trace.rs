// reads request traces, one request per line:
//
//     <proc> R <addr>
//     <proc> W <addr> <data>
//
// numbers are decimal or 0x-prefixed hex, `#` starts a comment

use std::fs;
use std::path::Path;

use log::info;
use thiserror::Error;

use crate::moesi::{Addr, Byte, Insts, Request};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line}: {msg}")]
    Syntax { line: usize, msg: String },

    #[error("cannot read trace: {0}")]
    Io(#[from] std::io::Error),
}

fn syntax(line: usize, msg: impl Into<String>) -> TraceError {
    TraceError::Syntax { line, msg: msg.into() }
}

fn parse_num(s: &str) -> Option<i64> {
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let v = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if neg { -v } else { v })
}

fn parse_line(n: usize, line: &str) -> Result<Option<Request>, TraceError> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    let mut field = |what: &str| parts.next().ok_or_else(|| syntax(n, format!("missing {what}")));

    let proc = field("processor")?;
    let proc = parse_num(proc)
        .and_then(|p| usize::try_from(p).ok())
        .ok_or_else(|| syntax(n, format!("bad processor id `{proc}`")))?;
    let op = field("operation")?.to_ascii_uppercase();
    let addr = field("address")?;
    let addr = Addr(parse_num(addr).ok_or_else(|| syntax(n, format!("bad address `{addr}`")))?);

    let req = match op.as_str() {
        "R" => Request::Read { proc, addr },
        "W" => {
            let data = field("data")?;
            let data = parse_num(data)
                .and_then(|d| Byte::try_from(d).ok())
                .ok_or_else(|| syntax(n, format!("bad data byte `{data}`")))?;
            Request::Write { proc, addr, data }
        }
        other => return Err(syntax(n, format!("unknown operation `{other}`"))),
    };
    if let Some(extra) = parts.next() {
        return Err(syntax(n, format!("unexpected `{extra}`")));
    }
    Ok(Some(req))
}

pub fn parse_trace(text: &str) -> Result<Insts, TraceError> {
    let mut insts = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(req) = parse_line(i + 1, line)? {
            insts.push(req);
        }
    }
    Ok(insts)
}

pub fn read_trace(path: impl AsRef<Path>) -> Result<Insts, TraceError> {
    let path = path.as_ref();
    info!("reading trace: {}", path.display());
    parse_trace(&fs::read_to_string(path)?)
}
