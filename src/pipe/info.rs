//! Diagnostic view of pipe bindings
//!
//! Renders one tree per pipe: the push worker at the root branch and the pull
//! workers as its children.
//!
//! ```text
//! .
//! └── enc_2_0
//!     ├── dec_1_0
//!     └── dec_3_0
//! ```

use std::io::{self, Write};

use super::entry::Pipe;
use super::PipeKind;
use crate::path::PathId;

/// Snapshot of one pipe's bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeInfo {
    pub kind: PipeKind,
    pub path: PathId,
    pub in_ports: [u32; 2],
    /// Push worker name
    pub inbound: Option<String>,
    /// Pull worker names, in slot order
    pub outbound: Vec<String>,
}

impl PipeInfo {
    pub(super) fn from_pipe(kind: PipeKind, path: PathId, pipe: &Pipe) -> Self {
        Self {
            kind,
            path,
            in_ports: pipe.in_ports,
            inbound: pipe.inbound().map(|w| w.name().to_owned()),
            outbound: pipe
                .outbound()
                .iter()
                .map(|o| o.worker.name().to_owned())
                .collect(),
        }
    }

    /// Write this pipe as a tree
    pub fn write_tree<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, ".")?;
        writeln!(w, "└── {}", self.inbound.as_deref().unwrap_or(""))?;

        let last = self.outbound.len().saturating_sub(1);
        for (i, name) in self.outbound.iter().enumerate() {
            let connector = if i == last { "└──" } else { "├──" };
            writeln!(w, "    {} {}", connector, name)?;
        }

        Ok(())
    }
}

/// Write every snapshot as a tree, one after the other
pub fn write_trees<W: Write>(w: &mut W, infos: &[PipeInfo]) -> io::Result<()> {
    for info in infos {
        info.write_tree(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(inbound: Option<&str>, outbound: &[&str]) -> PipeInfo {
        PipeInfo {
            kind: PipeKind::Encoder,
            path: PathId::new(0),
            in_ports: [8000, 8002],
            inbound: inbound.map(str::to_owned),
            outbound: outbound.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_tree_with_children() {
        let mut out = Vec::new();
        info(Some("enc_2_0"), &["dec_1_0", "dec_3_0"])
            .write_tree(&mut out)
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            ".\n└── enc_2_0\n    ├── dec_1_0\n    └── dec_3_0\n"
        );
    }

    #[test]
    fn test_tree_without_inbound() {
        let mut out = Vec::new();
        info(None, &["dec_1_0"]).write_tree(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, ".\n└── \n    └── dec_1_0\n");
    }

    #[test]
    fn test_write_trees() {
        let mut out = Vec::new();
        write_trees(&mut out, &[info(Some("a_1_0"), &[]), info(Some("b_2_0"), &[])]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(".\n").count(), 2);
    }
}
