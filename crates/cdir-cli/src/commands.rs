//! Subcommand handlers.
//!
//! Handlers write JSON to the given writer and return the process exit code.
//! Directory errors are written as `{"id", "message"}` bodies and mapped to
//! an exit code by category; anything else propagates as `anyhow::Error`.

use std::io::Write;

use clap::Args;
use serde::Serialize;

use cdir_core::{DirectoryError, ErrorCategory, Resolver};

/// Exit code for a directory error category.
pub fn exit_code(category: ErrorCategory) -> u8 {
    match category {
        ErrorCategory::Internal => 1,
        ErrorCategory::BadRequest => 2,
        ErrorCategory::NotFound => 3,
    }
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// `<identifierType>:<identifier>`, e.g. `tel:+14441235555`.
    pub query: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// `<identifierType>:<identifier>`, e.g. `tel:+14441235555`.
    pub query: String,

    /// Scheme code of the DFSP claiming the identifier.
    #[arg(long)]
    pub dfsp: String,

    /// Make this DFSP the primary receiver.
    #[arg(long)]
    pub primary: bool,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    id: &'a str,
    message: String,
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn report(out: &mut impl Write, err: &DirectoryError) -> anyhow::Result<u8> {
    tracing::warn!(error = err.name(), category = %err.category(), "{err}");
    write_json(
        out,
        &ErrorBody {
            id: err.name(),
            message: err.to_string(),
        },
    )?;
    Ok(exit_code(err.category()))
}

/// `cdir types`
pub fn run_types(resolver: &Resolver, out: &mut impl Write) -> anyhow::Result<u8> {
    write_json(out, &resolver.identifier_types())?;
    Ok(0)
}

/// `cdir lookup <query>`
pub async fn run_lookup(
    resolver: &Resolver,
    args: &LookupArgs,
    out: &mut impl Write,
) -> anyhow::Result<u8> {
    match resolver.lookup(&args.query).await {
        Ok(dfsps) => {
            write_json(out, &dfsps)?;
            Ok(0)
        }
        Err(e) => report(out, &e),
    }
}

/// `cdir register <query> --dfsp <code> [--primary]`
pub async fn run_register(
    resolver: &Resolver,
    args: &RegisterArgs,
    out: &mut impl Write,
) -> anyhow::Result<u8> {
    match resolver
        .register(&args.query, &args.dfsp, args.primary)
        .await
    {
        Ok(dfsp) => {
            write_json(out, &dfsp)?;
            Ok(0)
        }
        Err(e) => report(out, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use cdir_core::{
        Dfsp, Directory, DirectorySource, InMemoryDfsps, Registry, ResolutionRecord,
    };

    struct Fixed;

    #[async_trait]
    impl Directory for Fixed {
        fn identifier_type(&self) -> &str {
            "tel"
        }
        fn description(&self) -> &str {
            "E.164 phone number"
        }
        async fn find(&self, identifier: &str) -> Result<Vec<ResolutionRecord>, DirectoryError> {
            if identifier == "+14441235555" {
                Ok(vec![ResolutionRecord {
                    identifier: identifier.into(),
                    scheme_identifier: "001".into(),
                    dfsp_scheme_identifier: "002".into(),
                    primary: true,
                }])
            } else {
                Err(DirectoryError::NotFound("none".into()))
            }
        }
    }

    fn resolver(default_dfsp: Option<&str>) -> Resolver {
        let mut registry = Registry::new();
        registry.register([DirectorySource::ready(Fixed)]).unwrap();
        let dfsps = InMemoryDfsps::new(default_dfsp.map(String::from));
        dfsps.insert(Dfsp {
            name: "dfsp2".into(),
            short_name: "D2".into(),
            url: "http://d2".into(),
            dfsp_scheme_identifier: "002".into(),
        });
        Resolver::new(Arc::new(registry), Arc::new(dfsps), "001")
    }

    fn output(buf: Vec<u8>) -> serde_json::Value {
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn types_lists_identifier_types() {
        let mut buf = Vec::new();
        assert_eq!(run_types(&resolver(None), &mut buf).unwrap(), 0);
        let json = output(buf);
        assert_eq!(json[0]["identifierType"], "tel");
        assert_eq!(json[0]["description"], "E.164 phone number");
    }

    #[tokio::test]
    async fn lookup_prints_dfsps() {
        let mut buf = Vec::new();
        let args = LookupArgs {
            query: "tel:+14441235555".into(),
        };
        assert_eq!(run_lookup(&resolver(None), &args, &mut buf).await.unwrap(), 0);
        let json = output(buf);
        assert_eq!(json[0]["name"], "dfsp2");
        assert_eq!(json[0]["providerUrl"], "http://d2");
        assert_eq!(json[0]["primary"], true);
        assert_eq!(json[0]["registered"], true);
    }

    #[tokio::test]
    async fn lookup_unknown_type_is_bad_request() {
        let mut buf = Vec::new();
        let args = LookupArgs {
            query: "fax:123".into(),
        };
        assert_eq!(run_lookup(&resolver(None), &args, &mut buf).await.unwrap(), 2);
        let json = output(buf);
        assert_eq!(json["id"], "InvalidQueryParameterError");
        assert_eq!(json["message"], "'fax' is not a registered identifierType");
    }

    #[tokio::test]
    async fn lookup_without_default_dfsp_is_internal() {
        let mut buf = Vec::new();
        let args = LookupArgs {
            query: "tel:+15550000000".into(),
        };
        assert_eq!(run_lookup(&resolver(None), &args, &mut buf).await.unwrap(), 1);
        assert_eq!(output(buf)["id"], "InternalError");
    }

    #[tokio::test]
    async fn register_on_read_only_directory_is_bad_request() {
        let mut buf = Vec::new();
        let args = RegisterArgs {
            query: "tel:+14441235555".into(),
            dfsp: "002".into(),
            primary: true,
        };
        assert_eq!(run_register(&resolver(None), &args, &mut buf).await.unwrap(), 2);
        assert_eq!(output(buf)["id"], "RegistrationUnsupportedError");
    }

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(exit_code(ErrorCategory::Internal), 1);
        assert_eq!(exit_code(ErrorCategory::BadRequest), 2);
        assert_eq!(exit_code(ErrorCategory::NotFound), 3);
    }

    #[tokio::test]
    async fn lookup_unregistered_falls_back_to_default() {
        let mut buf = Vec::new();
        let args = LookupArgs {
            query: "tel:+15550000000".into(),
        };
        let code = run_lookup(&resolver(Some("dfsp2")), &args, &mut buf)
            .await
            .unwrap();
        assert_eq!(code, 0);
        let json = output(buf);
        assert_eq!(json[0]["name"], "dfsp2");
        assert_eq!(json[0]["registered"], false);
    }
}
