//! Command line: import (JSON Schema → declaration), emit (canonical
//! re-emission), export (declaration → JSON Schema), types (declaration →
//! TypeScript type).
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use schema_ir::{
    DeclarationForm, ImportOptions, Importer, Schema, TypeDeclarationOptions, UnknownFormatPolicy, export_document,
    parse_declaration,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// convert between JSON Schema documents and schema declarations
#[derive(Parser, Debug)]
#[command(name = "schema-ir")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// read JSON Schema documents and print their declarations
    Import(ImportOut),
    /// read declarations and print them in canonical form
    Emit(DeclarationOut),
    /// read declarations and print them as JSON Schema
    Export(DeclarationOut),
    /// read declarations and print them as TypeScript types
    Types(TypesOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ImportOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// JSON Pointer to select the schema in each document (e.g. /components/schemas/User)
    #[arg(long)]
    json_pointer: Option<String>,

    /// fail on unknown string formats instead of ignoring them
    #[arg(long, default_value_t = false)]
    reject_unknown_formats: bool,

    /// do not treat untyped documents with object keywords as objects
    #[arg(long, default_value_t = false)]
    no_infer_objects: bool,
}

#[derive(clap::Parser, Debug)]
struct DeclarationOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct TypesOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// wrap the type in a declaration named by the schema title
    #[arg(long, value_enum, default_value_t = Declaration::None)]
    declaration: Declaration,

    /// render properties with defaults as optional keys
    #[arg(long, default_value_t = false)]
    treat_default_as_optional: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Declaration {
    None,
    Variable,
    Type,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Run `apply` over every input in parallel; results keep input order.
    fn load_process<F>(&self, apply: F) -> anyhow::Result<Vec<(PathBuf, String)>>
    where
        F: Fn(&Path, &str) -> anyhow::Result<String> + Sync,
    {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        source_paths
            .into_par_iter()
            .map(|source_path| {
                let source = std::fs::read_to_string(&source_path)
                    .with_context(|| format!("failed to read source file {}", source_path.display()))?;
                let output = apply(&source_path, &source).with_context(|| format!("{}", source_path.display()))?;
                Ok((source_path, output))
            })
            .collect()
    }

    fn write(&self, outputs: Vec<(PathBuf, String)>) -> anyhow::Result<()> {
        let text = match outputs.as_slice() {
            [(_, single)] => single.clone(),
            _ => outputs
                .iter()
                .map(|(path, output)| format!("// {}\n{output}", path.display()))
                .collect::<Vec<_>>()
                .join("\n\n"),
        };
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(out, format!("{text}\n")).with_context(|| format!("failed to write {}", out.display()))?;
                eprintln!("{} {}", "wrote".green().bold(), out.display());
            }
            None => println!("{text}"),
        }
        Ok(())
    }
}

impl ImportOut {
    fn importer(&self) -> Importer {
        Importer::new(ImportOptions {
            infer_object_members: !self.no_infer_objects,
            unknown_format_policy: if self.reject_unknown_formats {
                UnknownFormatPolicy::Reject
            } else {
                UnknownFormatPolicy::Warn
            },
        })
    }
}

impl TypesOut {
    fn options(&self) -> TypeDeclarationOptions {
        TypeDeclarationOptions {
            declaration: match self.declaration {
                Declaration::None => DeclarationForm::None,
                Declaration::Variable => DeclarationForm::Variable,
                Declaration::Type => DeclarationForm::Type,
            },
            treat_default_as_optional: self.treat_default_as_optional,
        }
    }
}

fn parse_source(source: &str) -> anyhow::Result<Schema> {
    Ok(parse_declaration(source.trim())?)
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Import(target) => {
                let importer = target.importer();
                let outputs = target.input_settings.load_process(|_, source| {
                    let document = serde_json::from_str::<serde_json::Value>(source).context("invalid JSON")?;
                    let document = match target.json_pointer.as_deref() {
                        None => &document,
                        Some(pointer) => document
                            .pointer(pointer)
                            .ok_or_else(|| anyhow!("json pointer {pointer} selects nothing"))?,
                    };
                    let schema = importer.import(document)?;
                    Ok(schema.to_declaration()?)
                })?;
                target.input_settings.write(outputs)
            }
            Command::Emit(target) => {
                let outputs = target.input_settings.load_process(|_, source| Ok(parse_source(source)?.to_declaration()?))?;
                target.input_settings.write(outputs)
            }
            Command::Export(target) => {
                let outputs = target.input_settings.load_process(|_, source| {
                    let document = export_document(&parse_source(source)?)?;
                    Ok(serde_json::to_string_pretty(&document)?)
                })?;
                target.input_settings.write(outputs)
            }
            Command::Types(target) => {
                let options = target.options();
                let outputs = target
                    .input_settings
                    .load_process(|_, source| Ok(parse_source(source)?.to_type_declaration(&options)?))?;
                target.input_settings.write(outputs)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "b/c.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("b/c.json")]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        assert!(resolve_file_path_patterns(["/definitely/not/here/*.json"]).is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = CommandLineInterface::try_parse_from([
            "schema-ir",
            "import",
            "--input",
            "a.json",
            "--json-pointer",
            "/definitions/User",
            "--reject-unknown-formats",
        ])
        .unwrap();
        let Command::Import(target) = cli.cmd else { panic!("import expected") };
        assert_eq!(target.json_pointer.as_deref(), Some("/definitions/User"));
        assert_eq!(target.importer().options.unknown_format_policy, UnknownFormatPolicy::Reject);
    }

    #[test]
    fn types_subcommand_parses_declaration_form() {
        let cli = CommandLineInterface::try_parse_from(["schema-ir", "types", "-i", "a.decl", "--declaration", "type"])
            .unwrap();
        let Command::Types(target) = cli.cmd else { panic!("types expected") };
        assert_eq!(target.options().declaration, DeclarationForm::Type);
        assert!(!target.options().treat_default_as_optional);
    }
}
