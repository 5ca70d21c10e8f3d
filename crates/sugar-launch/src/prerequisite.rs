use std::{
    borrow::Cow,
    io,
    path::{Path, PathBuf},
    process::Command,
};

/// Variable restricting the child to one GPU.
pub const GPU_ENV_VAR: &str = "CUDA_VISIBLE_DEVICES";

/// A vanilla 3DGS training run, expressed as a shell command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrerequisiteCommand {
    pub gpu: u32,
    pub python: String,
    pub script: PathBuf,
    pub scene_path: PathBuf,
    pub model_dir: PathBuf,
    pub white_background: bool,
    pub iterations: u32,
}

impl PrerequisiteCommand {
    /// Unquoted argument tokens, interpreter first.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = vec![
            self.python.clone(),
            self.script.to_string_lossy().into_owned(),
            "-s".to_owned(),
            self.scene_path.to_string_lossy().into_owned(),
            "-m".to_owned(),
            self.model_dir.to_string_lossy().into_owned(),
        ];
        if self.white_background {
            tokens.push("-w".to_owned());
        }
        tokens.push("--iterations".to_owned());
        tokens.push(self.iterations.to_string());
        tokens
    }

    pub fn env_assignment(&self) -> String {
        format!("{GPU_ENV_VAR}={}", self.gpu)
    }

    /// The full line handed to `sh -c`. Only the environment assignment is left unquoted.
    pub fn shell_line(&self) -> String {
        let mut line = self.env_assignment();
        for token in self.tokens() {
            line.push(' ');
            line.push_str(&shell_quote(&token));
        }
        line
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c)
}

/// Quote a token for a POSIX shell. Tokens made only of safe characters pass through.
pub fn shell_quote(token: &str) -> Cow<'_, str> {
    if token.is_empty() {
        return Cow::Borrowed("''");
    }
    if token.chars().all(is_shell_safe) {
        return Cow::Borrowed(token);
    }
    Cow::Owned(format!("'{}'", token.replace('\'', r#"'"'"'"#)))
}

/// Runs the prerequisite training process.
pub trait PrerequisiteRunner {
    /// Blocks until the command finishes. Returns the exit code, or `None`
    /// when the process was terminated by a signal.
    fn run(&mut self, command: &PrerequisiteCommand, working_dir: &Path)
        -> io::Result<Option<i32>>;
}

/// Runs the command line through `sh -c`, inheriting stdio. No timeout.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl PrerequisiteRunner for ShellRunner {
    fn run(
        &mut self,
        command: &PrerequisiteCommand,
        working_dir: &Path,
    ) -> io::Result<Option<i32>> {
        let line = command.shell_line();
        log::debug!("sh -c {line} (in {})", working_dir.display());

        let status = Command::new("sh")
            .arg("-c")
            .arg(&line)
            .current_dir(working_dir)
            .status()?;
        Ok(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> PrerequisiteCommand {
        PrerequisiteCommand {
            gpu: 1,
            python: "python".to_owned(),
            script: PathBuf::from("./gaussian_splatting/train.py"),
            scene_path: PathBuf::from("data/room"),
            model_dir: PathBuf::from("output/vanilla_gs/room"),
            white_background: false,
            iterations: 15000,
        }
    }

    #[test]
    fn quoting() {
        assert_eq!(shell_quote("data/room_1"), "data/room_1");
        assert_eq!(shell_quote("--iterations"), "--iterations");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("my room"), "'my room'");
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(shell_quote("$(rm -rf ~)"), "'$(rm -rf ~)'");
    }

    #[test]
    fn plain_line() {
        assert_eq!(
            command().shell_line(),
            "CUDA_VISIBLE_DEVICES=1 python ./gaussian_splatting/train.py \
             -s data/room -m output/vanilla_gs/room --iterations 15000"
        );
    }

    #[test]
    fn white_background_switch() {
        let mut cmd = command();
        cmd.white_background = true;
        cmd.scene_path = PathBuf::from("data/my scene");
        let tokens = cmd.tokens();
        assert_eq!(tokens[3], "data/my scene");
        assert_eq!(
            tokens[6..],
            ["-w".to_owned(), "--iterations".to_owned(), "15000".to_owned()]
        );
        assert!(cmd.shell_line().contains(" -s 'data/my scene' "));
    }

    #[cfg(unix)]
    #[test]
    fn shell_runner_reports_exit_code() {
        let mut runner = ShellRunner;
        let mut cmd = command();

        cmd.python = "true".to_owned();
        let code = runner.run(&cmd, &std::env::temp_dir()).expect("sh missing");
        assert_eq!(code, Some(0));

        cmd.python = "false".to_owned();
        let code = runner.run(&cmd, &std::env::temp_dir()).expect("sh missing");
        assert_eq!(code, Some(1));
    }
}
