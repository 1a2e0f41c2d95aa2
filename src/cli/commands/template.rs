//! `podrecon template` command - write the blank order template

use std::path::PathBuf;

use miette::Result;
use rust_embed::Embed;

use crate::cli::commands::utils::{output_target, write_output};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// File name of the order template
pub const ORDER_TEMPLATE: &str = "order_template.csv";

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Output file or directory (stdout if omitted)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

/// Bytes of an embedded template
pub fn template_bytes(name: &str) -> Option<Vec<u8>> {
    EmbeddedTemplates::get(name).map(|file| file.data.into_owned())
}

pub fn run(args: TemplateArgs) -> Result<()> {
    let bytes = template_bytes(ORDER_TEMPLATE)
        .ok_or_else(|| miette::miette!("embedded template '{}' is missing", ORDER_TEMPLATE))?;
    write_output(output_target(args.out.as_deref(), ORDER_TEMPLATE).as_deref(), &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_template_columns() {
        let bytes = template_bytes(ORDER_TEMPLATE).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().next(), Some("ISBN,Qty,Master"));
    }

    #[test]
    fn test_unknown_template() {
        assert!(template_bytes("nope.csv").is_none());
    }
}
