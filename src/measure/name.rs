//! Tokenizer for composite benchmark names.
//!
//! Go benchmark names built with `b.Run` look like
//! `BenchmarkVCSAgg/30/AggregateProve;1024-8`: sub-benchmark path segments
//! after `/`, a transaction count after `;`, and the GOMAXPROCS suffix after
//! `-`. Suffixes are peeled from the right end of the name, so only the last
//! occurrence of each separator acts as a boundary. A separator character
//! inside a field is mis-split; callers accept that.

use regex::Regex;

/// Sub-benchmark path carried after the base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathShape {
    /// `/<operation>`
    Operation,
    /// `/<height>/<operation>`
    HeightOperation,
}

/// Which suffixes to peel off a test name, and how to clean the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRule {
    pub cores: bool,
    pub txn: bool,
    pub path: PathShape,
    /// Literal removed from the operation field.
    pub strip_operation: Option<String>,
    /// Literal removed from the base name.
    pub strip_base: Option<String>,
}

impl Default for NameRule {
    fn default() -> Self {
        Self {
            cores: true,
            txn: true,
            path: PathShape::HeightOperation,
            strip_operation: None,
            strip_base: None,
        }
    }
}

/// Tagged fields recovered from a test name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFields {
    pub base: String,
    pub cores: Option<String>,
    pub txn: Option<String>,
    pub height: Option<String>,
    pub operation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    Cores,
    Txn,
    Path,
}

/// Peel order when several suffixes could match at the current end.
const PRECEDENCE: [Suffix; 3] = [Suffix::Cores, Suffix::Txn, Suffix::Path];

pub struct NameTokenizer {
    rule: NameRule,
    cores_re: Regex,
    txn_re: Regex,
    path_re: Regex,
}

impl NameTokenizer {
    pub fn new(rule: NameRule) -> anyhow::Result<Self> {
        let path_re = match rule.path {
            PathShape::Operation => Regex::new(r"/([^/;]*)$")?,
            PathShape::HeightOperation => Regex::new(r"/(\d+)/([^/;]*)$")?,
        };
        Ok(Self {
            rule,
            cores_re: Regex::new(r"-(\d+)$")?,
            txn_re: Regex::new(r";(\d*)$")?,
            path_re,
        })
    }

    /// Split `name` into its tagged fields.
    pub fn decompose(&self, name: &str) -> NameFields {
        let mut fields = NameFields::default();
        let mut rest = name;
        let mut found: Vec<Suffix> = Vec::new();

        'peel: loop {
            for suffix in PRECEDENCE {
                if found.contains(&suffix) {
                    continue;
                }
                if let Some(cut) = self.peel(suffix, rest, &mut fields) {
                    rest = &rest[..cut];
                    found.push(suffix);
                    continue 'peel;
                }
            }
            break;
        }

        let mut base = rest.to_string();
        if let Some(strip) = &self.rule.strip_base {
            base = base.replace(strip.as_str(), "");
        }
        fields.base = base;

        if let (Some(strip), Some(op)) =
            (&self.rule.strip_operation, fields.operation.as_mut())
        {
            *op = op.replace(strip.as_str(), "");
        }

        fields
    }

    /// Try one suffix at the end of `rest`; on a match, record it and return
    /// where the remaining name ends.
    fn peel(&self, suffix: Suffix, rest: &str, fields: &mut NameFields) -> Option<usize> {
        match suffix {
            Suffix::Cores if self.rule.cores => {
                let caps = self.cores_re.captures(rest)?;
                fields.cores = Some(caps[1].to_string());
                Some(caps.get(0)?.start())
            }
            Suffix::Txn if self.rule.txn => {
                let caps = self.txn_re.captures(rest)?;
                fields.txn = Some(caps[1].to_string()).filter(|s| !s.is_empty());
                Some(caps.get(0)?.start())
            }
            Suffix::Path => {
                let caps = self.path_re.captures(rest)?;
                match self.rule.path {
                    PathShape::HeightOperation => {
                        fields.height = Some(caps[1].to_string());
                        fields.operation = Some(caps[2].to_string());
                    }
                    PathShape::Operation => fields.operation = Some(caps[1].to_string()),
                }
                Some(caps.get(0)?.start())
            }
            _ => None,
        }
    }
}
