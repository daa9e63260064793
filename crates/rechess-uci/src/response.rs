//! Parsing of lines sent by a UCI engine.

use std::str::FromStr;
use std::time::Duration;

use rechess_core::Move;

use crate::error::UciError;
use crate::score::Score;

/// One `info` line.
///
/// Every field is optional because engines send partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Info {
    /// Search depth in plies.
    pub depth: Option<u32>,
    /// Selective search depth.
    pub seldepth: Option<u32>,
    /// Index of this line in multi-PV mode, starting at 1.
    pub multipv: Option<u32>,
    /// Evaluation from the side to move's point of view.
    pub score: Option<Score>,
    /// Nodes searched.
    pub nodes: Option<u64>,
    /// Nodes per second.
    pub nps: Option<u64>,
    /// Time spent searching.
    pub time: Option<Duration>,
    /// Principal variation, best move first.
    pub pv: Vec<Move>,
    /// Free-form text after `string`.
    pub string: Option<String>,
}

/// A parsed line of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `id name <name>`.
    IdName(String),
    /// `id author <author>`.
    IdAuthor(String),
    /// `uciok` -- the engine finished listing its identity and options.
    UciOk,
    /// `readyok` -- answer to `isready`.
    ReadyOk,
    /// `option name ...`, kept as the raw text after `option`.
    Option(String),
    /// `info ...`.
    Info(Info),
    /// `bestmove <move> [ponder <move>]`; `best` is `None` for `(none)` or `0000`.
    BestMove {
        best: Option<Move>,
        ponder: Option<Move>,
    },
    /// Anything else (ignored, as the protocol requires).
    Unknown(String),
}

/// Parse a single line of engine output into a [`Response`].
pub fn parse_response(line: &str) -> Result<Response, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Response::Unknown(String::new()));
    }

    match tokens[0] {
        "uciok" => Ok(Response::UciOk),
        "readyok" => Ok(Response::ReadyOk),
        "id" => Ok(parse_id(&tokens[1..], line)),
        "option" => Ok(Response::Option(tokens[1..].join(" "))),
        "info" => parse_info(&tokens[1..]).map(Response::Info),
        "bestmove" => parse_bestmove(&tokens[1..], line),
        _ => Ok(Response::Unknown(line.trim().to_string())),
    }
}

fn parse_id(tokens: &[&str], line: &str) -> Response {
    match tokens.first() {
        Some(&"name") => Response::IdName(tokens[1..].join(" ")),
        Some(&"author") => Response::IdAuthor(tokens[1..].join(" ")),
        _ => Response::Unknown(line.trim().to_string()),
    }
}

/// Parse the `bestmove` arguments.
fn parse_bestmove(tokens: &[&str], line: &str) -> Result<Response, UciError> {
    let Some(&first) = tokens.first() else {
        return Err(UciError::Protocol {
            line: line.to_string(),
        });
    };

    let best = parse_optional_move(first)?;
    let ponder = match tokens.get(1..3) {
        Some(&["ponder", text]) => parse_optional_move(text)?,
        _ => None,
    };

    Ok(Response::BestMove { best, ponder })
}

fn parse_optional_move(text: &str) -> Result<Option<Move>, UciError> {
    match text {
        "(none)" | "0000" => Ok(None),
        _ => Ok(Some(Move::from_uci(text)?)),
    }
}

/// Parse the `info` arguments.
///
/// Supports: depth, seldepth, multipv, score (cp/mate, bounds ignored), nodes,
/// nps, time, pv, string. Unknown tokens are silently skipped.
fn parse_info(tokens: &[&str]) -> Result<Info, UciError> {
    let mut info = Info::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                info.depth = Some(parse_int(tokens.get(i + 1), "depth")?);
                i += 2;
            }
            "seldepth" => {
                info.seldepth = Some(parse_int(tokens.get(i + 1), "seldepth")?);
                i += 2;
            }
            "multipv" => {
                info.multipv = Some(parse_int(tokens.get(i + 1), "multipv")?);
                i += 2;
            }
            "nodes" => {
                info.nodes = Some(parse_int(tokens.get(i + 1), "nodes")?);
                i += 2;
            }
            "nps" => {
                info.nps = Some(parse_int(tokens.get(i + 1), "nps")?);
                i += 2;
            }
            "time" => {
                info.time = Some(Duration::from_millis(parse_int(tokens.get(i + 1), "time")?));
                i += 2;
            }
            "score" => {
                let kind = tokens.get(i + 1);
                let value: i32 = parse_int(tokens.get(i + 2), "score")?;
                info.score = match kind {
                    Some(&"cp") => Some(Score::Centipawns(value)),
                    Some(&"mate") => Some(Score::Mate(value)),
                    _ => {
                        return Err(UciError::InvalidValue {
                            param: "score".to_string(),
                            value: kind.map_or_else(String::new, |k| k.to_string()),
                        });
                    }
                };
                i += 3;
            }
            "pv" => {
                // The principal variation runs to the end of the line.
                info.pv = tokens[i + 1..]
                    .iter()
                    .map(|t| Move::from_uci(t))
                    .collect::<Result<Vec<_>, _>>()?;
                break;
            }
            "string" => {
                info.string = Some(tokens[i + 1..].join(" "));
                break;
            }
            _ => {
                // Unknown token or bound flag -- skip per UCI convention
                i += 1;
            }
        }
    }

    Ok(info)
}

/// Parse an integer value from a token.
fn parse_int<T: FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}
