use std::env;
use std::iter;
use std::path::Path;

use bytes::Bytes;

use crate::error::{ShellError, ShellResult};
use crate::history::History;
use crate::path::PathResolver;

/// Name of the builtin that ends the session. It has no handler: the
/// session loop and the executor act on it directly.
pub const EXIT: &str = "exit";

/// State a builtin may read or change.
pub struct Context<'a> {
    pub history: &'a mut History,
    pub resolver: &'a PathResolver,
}

/// Runs a builtin. `args[0]` is the command name. The returned bytes go to
/// stdout, the error is printed on stderr.
pub type BuiltinFn = fn(&[String], &mut Context<'_>) -> ShellResult<Bytes>;

pub struct Builtin {
    pub name: &'static str,
    pub run: BuiltinFn,
}

/// List of builtin commands
pub const BUILTINS: &[Builtin] = &[
    Builtin { name: "echo", run: execute_echo },
    Builtin { name: "type", run: execute_type },
    Builtin { name: "pwd", run: execute_pwd },
    Builtin { name: "cd", run: execute_cd },
    Builtin { name: "history", run: execute_history },
];

/// All names `type` and completion treat as builtins, `exit` included.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name).chain(iter::once(EXIT))
}

pub fn is_builtin(name: &str) -> bool {
    builtin_names().any(|b| b == name)
}

/// How a command name is dispatched.
#[derive(Clone, Copy)]
pub enum Command<'a> {
    Builtin(&'static Builtin),
    Exit,
    External(&'a str),
}

impl<'a> Command<'a> {
    pub fn classify(name: &'a str) -> Self {
        if name == EXIT {
            return Command::Exit;
        }
        BUILTINS
            .iter()
            .find(|b| b.name == name)
            .map_or(Command::External(name), Command::Builtin)
    }
}

fn execute_echo(args: &[String], _: &mut Context<'_>) -> ShellResult<Bytes> {
    Ok(Bytes::from(args[1..].join(" ") + "\n"))
}

fn execute_pwd(_: &[String], _: &mut Context<'_>) -> ShellResult<Bytes> {
    let cwd = env::current_dir()?;
    Ok(Bytes::from(format!("{}\n", cwd.display())))
}

fn execute_cd(args: &[String], _: &mut Context<'_>) -> ShellResult<Bytes> {
    let home = || env::var("HOME").map_err(|_| ShellError::HomeNotSet);
    let target = match args.get(1).map(String::as_str) {
        None | Some("~") => home()?,
        Some(arg) => match arg.strip_prefix("~/") {
            Some(rest) => format!("{}/{}", home()?, rest),
            None => arg.to_string(),
        },
    };
    env::set_current_dir(&target).map_err(|_| ShellError::NoSuchDirectory(target))?;
    Ok(Bytes::new())
}

fn execute_type(args: &[String], ctx: &mut Context<'_>) -> ShellResult<Bytes> {
    let Some(arg) = args.get(1) else {
        return Err(ShellError::MissingArgument("type"));
    };

    if is_builtin(arg) {
        Ok(Bytes::from(format!("{} is a shell builtin\n", arg)))
    } else {
        match ctx.resolver.find(arg) {
            Some(path) => Ok(Bytes::from(format!("{} is {}\n", arg, path.display()))),
            None => Err(ShellError::NotFound(arg.clone())),
        }
    }
}

fn execute_history(args: &[String], ctx: &mut Context<'_>) -> ShellResult<Bytes> {
    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("-r"), Some(file)) => ctx.history.read_from(Path::new(file))?,
        (Some("-w"), Some(file)) => ctx.history.write_to(Path::new(file))?,
        (Some("-a"), Some(file)) => ctx.history.append_to(Path::new(file))?,
        (limit, _) => {
            let limit = limit.and_then(|n| n.parse().ok());
            return Ok(ctx.history.render(limit));
        }
    }
    Ok(Bytes::new())
}
