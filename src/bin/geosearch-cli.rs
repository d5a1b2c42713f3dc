//! geosearch interactive shell
//!
//! Redis-style commands over stdin:
//!   FT.CREATE idx [ON HASH|JSON] [PREFIX n p...] SCHEMA path [AS alias] GEOMETRY ...
//!   FT.SEARCH idx "@geom:[within:POLYGON((...))]" [PARAMS n k v...] [DIALECT d] [LIMIT off num]
//!   FT.INFO idx | FT.DROPINDEX idx | FT._LIST
//!   HSET key f v... | HDEL key f... | HGETALL key
//!   JSON.SET key path json | JSON.GET key | JSON.DEL key [path] | DEL key...

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use geosearch::document::{JsonPath, PathSegment};
use geosearch::{logging, GeoConfig, GeoDB, GeometryField, IndexSchema, Record, SearchOptions, SourceKind};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "geosearch-cli")]
#[command(about = "Geometry index shell", version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single command and exit
    #[arg(short, long)]
    eval: Option<String>,
}

/// Command reply
#[derive(Debug, Clone, PartialEq)]
enum Reply {
    Ok,
    Nil,
    Integer(i64),
    Bulk(String),
    Array(Vec<Reply>),
}

impl Reply {
    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(s) => write!(f, "\"{}\"", s),
            Reply::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "\n{:indent$}", "", indent = indent)?;
                    }
                    let label = format!("{}) ", i + 1);
                    write!(f, "{}", label)?;
                    item.write_indented(f, indent + label.len())?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

fn bulk(s: impl Into<String>) -> Reply {
    Reply::Bulk(s.into())
}

fn integer(n: usize) -> Reply {
    Reply::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GeoConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GeoConfig::default(),
    };
    logging::init(&config.log);
    let db = GeoDB::with_config(config)?;

    match cli.eval {
        Some(line) => {
            let tokens = tokenize(&line)?;
            println!("{}", execute(&db, &tokens)?);
            Ok(())
        }
        None => interactive_mode(&db),
    }
}

fn interactive_mode(db: &GeoDB) -> Result<()> {
    println!("geosearch v{}", env!("CARGO_PKG_VERSION"));
    println!("Type '.help' for help, '.exit' to quit\n");

    let stdin = io::stdin();
    let mut buffer = String::new();
    loop {
        print!("geosearch> ");
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }

        let input = buffer.trim();
        match input {
            "" => continue,
            ".exit" | ".quit" => break,
            ".help" => {
                print_help();
                continue;
            }
            _ => {}
        }

        let result = tokenize(input).and_then(|tokens| execute(db, &tokens));
        match result {
            Ok(reply) => println!("{}", reply),
            Err(e) => println!("(error) {:#}", e),
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"Commands:
  FT.CREATE idx [ON HASH|JSON] [PREFIX n p...] SCHEMA path [AS alias] GEOMETRY [...]
  FT.SEARCH idx query [PARAMS n name value...] [DIALECT d] [LIMIT offset num]
  FT.INFO idx
  FT.DROPINDEX idx
  FT._LIST
  HSET key field value [field value...]
  HDEL key field [field...]
  HGETALL key
  JSON.SET key path json
  JSON.GET key
  JSON.DEL key [path]
  DEL key [key...]"#
    );
}

/// Split a command line; single and double quotes group, `\` escapes inside double quotes
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            match c {
                '"' => loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => token.push(escaped),
                            None => bail!("unterminated double quote"),
                        },
                        Some(other) => token.push(other),
                        None => bail!("unterminated double quote"),
                    }
                },
                '\'' => loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(other) => token.push(other),
                        None => bail!("unterminated single quote"),
                    }
                },
                other => token.push(other),
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

fn execute(db: &GeoDB, tokens: &[String]) -> Result<Reply> {
    let (command, args) = tokens.split_first().ok_or_else(|| anyhow!("empty command"))?;

    match command.to_ascii_uppercase().as_str() {
        "FT.CREATE" => {
            db.create_index(parse_create(args)?)?;
            Ok(Reply::Ok)
        }
        "FT.DROPINDEX" => {
            let [name] = args else { bail!("usage: FT.DROPINDEX idx") };
            db.drop_index(name)?;
            Ok(Reply::Ok)
        }
        "FT.SEARCH" => {
            let (index, query, options) = parse_search(args)?;
            let result = db.search(index, query, &options)?;

            let mut items = vec![integer(result.total)];
            for hit in result.hits {
                items.push(bulk(hit.id));
                items.push(Reply::Array(
                    hit.fields
                        .into_iter()
                        .flat_map(|(name, value)| [bulk(name), bulk(value)])
                        .collect(),
                ));
            }
            Ok(Reply::Array(items))
        }
        "FT.INFO" => {
            let [name] = args else { bail!("usage: FT.INFO idx") };
            let info = db.index_info(name)?;
            let fields = info
                .fields
                .iter()
                .map(|f| {
                    Reply::Array(vec![
                        bulk("identifier"),
                        bulk(f.path.clone()),
                        bulk("attribute"),
                        bulk(f.alias.clone()),
                        bulk("type"),
                        bulk("GEOMETRY"),
                    ])
                })
                .collect();
            Ok(Reply::Array(vec![
                bulk("index_name"),
                bulk(info.name),
                bulk("key_type"),
                bulk(info.source.to_string()),
                bulk("prefixes"),
                Reply::Array(info.prefixes.into_iter().map(bulk).collect()),
                bulk("attributes"),
                Reply::Array(fields),
                bulk("num_docs"),
                integer(info.num_docs),
                bulk("hash_indexing_failures"),
                integer(info.failures),
                bulk("geometries_sz_mb"),
                bulk(format!("{:.6}", info.memory_bytes as f64 / (1024.0 * 1024.0))),
            ]))
        }
        "FT._LIST" => Ok(Reply::Array(db.list_indexes().into_iter().map(bulk).collect())),
        "HSET" => {
            let (key, pairs) = args
                .split_first()
                .filter(|(_, rest)| !rest.is_empty() && rest.len() % 2 == 0)
                .ok_or_else(|| anyhow!("usage: HSET key field value [field value ...]"))?;
            let fields: Vec<(&str, &str)> = pairs
                .chunks_exact(2)
                .map(|pair| (pair[0].as_str(), pair[1].as_str()))
                .collect();
            Ok(integer(db.hset(key, &fields)?))
        }
        "HDEL" => {
            let (key, names) = args
                .split_first()
                .filter(|(_, rest)| !rest.is_empty())
                .ok_or_else(|| anyhow!("usage: HDEL key field [field ...]"))?;
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            Ok(integer(db.hdel(key, &names)?))
        }
        "HGETALL" => {
            let [key] = args else { bail!("usage: HGETALL key") };
            match db.get(key) {
                Some(Record::Hash(fields)) => Ok(Reply::Array(
                    fields.into_iter().flat_map(|(f, v)| [bulk(f), bulk(v)]).collect(),
                )),
                Some(Record::Json(_)) => bail!("WRONGTYPE '{}' holds a JSON document", key),
                None => Ok(Reply::Array(Vec::new())),
            }
        }
        "JSON.SET" => {
            let [key, path, json] = args else { bail!("usage: JSON.SET key path json") };
            db.json_set(key, path, json)?;
            Ok(Reply::Ok)
        }
        "JSON.GET" => {
            let [key] = args else { bail!("usage: JSON.GET key") };
            match db.get(key) {
                Some(Record::Json(document)) => Ok(bulk(serde_json::to_string(&document)?)),
                Some(Record::Hash(_)) => bail!("WRONGTYPE '{}' holds a hash", key),
                None => Ok(Reply::Nil),
            }
        }
        "JSON.DEL" => {
            let (key, path) = match args {
                [key] => (key, "$"),
                [key, path] => (key, path.as_str()),
                _ => bail!("usage: JSON.DEL key [path]"),
            };
            Ok(integer(db.json_del(key, path)?))
        }
        "DEL" => {
            if args.is_empty() {
                bail!("usage: DEL key [key ...]");
            }
            Ok(integer(args.iter().filter(|key| db.del(key)).count()))
        }
        other => bail!("unknown command '{}'", other),
    }
}

fn keyword(token: &str, expected: &str) -> bool {
    token.eq_ignore_ascii_case(expected)
}

fn parse_count(token: Option<&String>, what: &str) -> Result<usize> {
    let token = token.ok_or_else(|| anyhow!("missing {}", what))?;
    token
        .parse()
        .with_context(|| format!("invalid {} '{}'", what, token))
}

/// FT.CREATE idx [ON HASH|JSON] [PREFIX n p...] SCHEMA path [AS alias] GEOMETRY ...
fn parse_create(args: &[String]) -> Result<IndexSchema> {
    let (name, rest) = args.split_first().ok_or_else(|| anyhow!("usage: FT.CREATE idx ... SCHEMA ..."))?;
    let mut source = SourceKind::Hash;
    let mut prefixes = Vec::new();
    let mut tokens = rest.iter();

    loop {
        let token = tokens.next().ok_or_else(|| anyhow!("missing SCHEMA"))?;
        if keyword(token, "ON") {
            let kind = tokens.next().ok_or_else(|| anyhow!("missing key type after ON"))?;
            source = if keyword(kind, "HASH") {
                SourceKind::Hash
            } else if keyword(kind, "JSON") {
                SourceKind::Json
            } else {
                bail!("unknown key type '{}'", kind);
            };
        } else if keyword(token, "PREFIX") {
            let count = parse_count(tokens.next(), "prefix count")?;
            for _ in 0..count {
                let prefix = tokens.next().ok_or_else(|| anyhow!("missing prefix"))?;
                prefixes.push(prefix.clone());
            }
        } else if keyword(token, "SCHEMA") {
            break;
        } else {
            bail!("unexpected argument '{}'", token);
        }
    }

    let mut schema = IndexSchema::new(name.clone(), source);
    schema.prefixes = prefixes;

    let schema_tokens: Vec<&String> = tokens.collect();
    let mut position = 0;
    while position < schema_tokens.len() {
        let path = schema_tokens[position];
        position += 1;

        let alias = if schema_tokens.get(position).is_some_and(|t| keyword(t, "AS")) {
            position += 2;
            schema_tokens
                .get(position - 1)
                .map(|t| t.to_string())
                .ok_or_else(|| anyhow!("missing alias after AS"))?
        } else {
            default_alias(source, path)?
        };

        match schema_tokens.get(position) {
            Some(t) if keyword(t, "GEOMETRY") => position += 1,
            Some(t) => bail!("unsupported field type '{}' for '{}'", t, path),
            None => bail!("missing field type for '{}'", path),
        }
        schema.fields.push(GeometryField::path(path.clone(), alias));
    }

    Ok(schema)
}

/// Hash fields are queried by name, JSON paths by their last key
fn default_alias(source: SourceKind, path: &str) -> Result<String> {
    match source {
        SourceKind::Hash => Ok(path.to_string()),
        SourceKind::Json => match JsonPath::parse(path)?.segments().last() {
            Some(PathSegment::Key(key)) => Ok(key.clone()),
            _ => bail!("'{}' needs an alias: {} AS name GEOMETRY", path, path),
        },
    }
}

/// FT.SEARCH idx query [PARAMS n name value...] [DIALECT d] [LIMIT offset num]
fn parse_search(args: &[String]) -> Result<(&str, &str, SearchOptions)> {
    let [index, query, rest @ ..] = args else {
        bail!("usage: FT.SEARCH idx query [PARAMS ...] [DIALECT d] [LIMIT offset num]");
    };

    let mut options = SearchOptions::default();
    let mut tokens = rest.iter();
    while let Some(token) = tokens.next() {
        if keyword(token, "PARAMS") {
            let count = parse_count(tokens.next(), "PARAMS count")?;
            if count % 2 != 0 {
                bail!("PARAMS count must be even, got {}", count);
            }
            for _ in 0..count / 2 {
                match (tokens.next(), tokens.next()) {
                    (Some(name), Some(value)) => options.params.insert(name.clone(), value.clone()),
                    _ => bail!("PARAMS expects {} arguments", count),
                };
            }
        } else if keyword(token, "DIALECT") {
            let dialect = parse_count(tokens.next(), "DIALECT")?;
            options.dialect = Some(u8::try_from(dialect).with_context(|| format!("invalid DIALECT {}", dialect))?);
        } else if keyword(token, "LIMIT") {
            options.offset = parse_count(tokens.next(), "LIMIT offset")?;
            options.limit = Some(parse_count(tokens.next(), "LIMIT num")?);
        } else {
            bail!("unexpected argument '{}'", token);
        }
    }

    Ok((index.as_str(), query.as_str(), options))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "POLYGON((1 1, 0 10, 10 10, 10 0, 1 1))";
    const LARGE: &str = "POLYGON((1 1, 0 20, 20 20, 20 0, 1 1))";

    fn run_line(db: &GeoDB, line: &str) -> Result<Reply> {
        execute(db, &tokenize(line)?)
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize(r#"HSET small geom 'POLYGON((1 1, 2 2))' x "a \"b\"""#).unwrap();
        assert_eq!(tokens, vec!["HSET", "small", "geom", "POLYGON((1 1, 2 2))", "x", "a \"b\""]);
        assert!(tokenize("HSET 'open").is_err());
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_hash_session() {
        let db = GeoDB::new();
        assert_eq!(run_line(&db, "FT.CREATE idx SCHEMA geom GEOMETRY").unwrap(), Reply::Ok);
        assert_eq!(run_line(&db, &format!("HSET small geom '{}'", SMALL)).unwrap(), Reply::Integer(1));
        assert_eq!(run_line(&db, &format!("HSET large geom '{}'", LARGE)).unwrap(), Reply::Integer(1));

        let reply = run_line(
            &db,
            "FT.SEARCH idx '@geom:[within:POLYGON((0 0, 0 15, 15 15, 15 0, 0 0))]' DIALECT 3",
        )
        .unwrap();
        assert_eq!(
            reply,
            Reply::Array(vec![
                Reply::Integer(1),
                bulk("small"),
                Reply::Array(vec![bulk("geom"), bulk(SMALL)]),
            ])
        );
    }

    #[test]
    fn test_json_session_with_params() {
        let db = GeoDB::new();
        run_line(&db, "FT.CREATE idx ON JSON SCHEMA $.geom AS geom GEOMETRY").unwrap();
        run_line(&db, &format!(r#"JSON.SET small $ '{{"geom": "{}"}}'"#, SMALL)).unwrap();
        run_line(&db, &format!(r#"JSON.SET large $ '{{"geom": "{}"}}'"#, LARGE)).unwrap();

        let reply = run_line(
            &db,
            "FT.SEARCH idx '@geom:[within $POLY]' PARAMS 2 POLY 'POLYGON((0 0, 0 15, 15 15, 15 0, 0 0))' DIALECT 3",
        )
        .unwrap();
        assert_eq!(
            reply,
            Reply::Array(vec![
                Reply::Integer(1),
                bulk("small"),
                Reply::Array(vec![bulk("geom"), bulk(SMALL)]),
            ])
        );
    }

    #[test]
    fn test_parse_create() {
        let tokens = tokenize("idx ON JSON PREFIX 2 a: b: SCHEMA $.g AS geom GEOMETRY $.h GEOMETRY").unwrap();
        let schema = parse_create(&tokens).unwrap();
        assert_eq!(schema.source, SourceKind::Json);
        assert_eq!(schema.prefixes, vec!["a:", "b:"]);
        assert_eq!(
            schema.fields,
            vec![GeometryField::path("$.g", "geom"), GeometryField::path("$.h", "h")]
        );

        let tokens = tokenize("idx ON JSON SCHEMA $.shape.outline GEOMETRY").unwrap();
        assert_eq!(parse_create(&tokens).unwrap().fields, vec![GeometryField::path("$.shape.outline", "outline")]);

        for bad in [
            "idx SCHEMA geom TEXT",
            "idx geom GEOMETRY",
            "idx ON XML SCHEMA g GEOMETRY",
            "idx SCHEMA g AS",
            "idx ON JSON SCHEMA $ GEOMETRY",
            "idx ON JSON SCHEMA $.shapes[0] GEOMETRY",
        ] {
            assert!(parse_create(&tokenize(bad).unwrap()).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_json_field_without_alias_is_queryable() {
        let db = GeoDB::new();
        run_line(&db, "FT.CREATE idx ON JSON SCHEMA $.geom GEOMETRY").unwrap();
        run_line(&db, &format!(r#"JSON.SET small $ '{{"geom": "{}", "name": "s"}}'"#, SMALL)).unwrap();

        let search = "FT.SEARCH idx '@geom:[within:POLYGON((0 0, 0 15, 15 15, 15 0, 0 0))]'";
        assert!(matches!(run_line(&db, search).unwrap(), Reply::Array(items) if items[0] == Reply::Integer(1)));

        assert_eq!(run_line(&db, "JSON.DEL small $.geom").unwrap(), Reply::Integer(1));
        assert_eq!(run_line(&db, search).unwrap(), Reply::Array(vec![Reply::Integer(0)]));
        assert_eq!(run_line(&db, "JSON.DEL small").unwrap(), Reply::Integer(1));
        assert_eq!(run_line(&db, "JSON.GET small").unwrap(), Reply::Nil);
    }

    #[test]
    fn test_command_errors() {
        let db = GeoDB::new();
        assert!(run_line(&db, "FT.SEARCH missing '@geom:[within:POLYGON((0 0, 1 0, 1 1, 0 0))]'").is_err());
        assert!(run_line(&db, "NOPE").is_err());
        assert!(run_line(&db, "HSET key geom").is_err());
        assert_eq!(run_line(&db, "DEL a b").unwrap(), Reply::Integer(0));
    }

    #[test]
    fn test_reply_format() {
        let reply = Reply::Array(vec![Reply::Integer(1), bulk("small"), Reply::Array(vec![bulk("geom"), bulk("x")])]);
        assert_eq!(reply.to_string(), "1) (integer) 1\n2) \"small\"\n3) 1) \"geom\"\n   2) \"x\"");
    }
}
