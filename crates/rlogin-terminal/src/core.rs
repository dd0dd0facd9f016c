//! `TerminalCore`'s engine: open/close, send/expect, check_output, prompt
//! management and stream recording.

use crate::open::{open_direct, open_via_proxy_jump};
use crate::options::{AskResponseTiming, TerminalOptions};
use crate::shell_login::ShellLogin;
use regex::Regex;
use rlogin_channel::{Channel, ConnectionSpec, RecvStatus};
use rlogin_core::{
    AskResponse, DataExchange, ExpectContract, MatchPolicy, PatternValue, TerminalConfig, TerminalError, TerminalErrorKind,
};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Per-call overrides for [`TerminalCore::expect`]. Everything defaults to
/// the engine's [`TerminalConfig`] / ordinary streaming behavior.
#[derive(Debug, Clone, Default)]
pub struct ExpectOptions {
    pub timeout: Option<Duration>,
    /// Re-synchronize to the start of the current line after every chunk
    /// that didn't complete a match, so a contract only ever sees what's
    /// been typed since the last newline (used by `check_output` so a
    /// pattern can't accidentally match text from an earlier line).
    pub reset_on_new_line: bool,
    pub buffer_size: Option<usize>,
    /// Start from an empty buffer instead of re-checking the last receive
    /// first. `check_output`/login steps want this; a bare `expect_prompt`
    /// right after a send usually doesn't need it.
    pub reset_buffer: bool,
}

/// The multi-hop login/expect/send engine. One instance per logical
/// terminal; `connections` is fixed at construction, `stack` grows by one
/// [`ShellLogin`] per hop as `open` succeeds.
pub struct TerminalCore {
    connections: Vec<ConnectionSpec>,
    stack: Vec<ShellLogin>,
    transport: Option<Box<dyn Channel>>,
    data: DataExchange,
    start_idx: usize,
    config: TerminalConfig,
    options: TerminalOptions,
    stop_signal: CancellationToken,
    last_cmd_sent: String,
    last_cmd_hidden: bool,
}

impl TerminalCore {
    pub fn new(connections: Vec<ConnectionSpec>, config: TerminalConfig, options: TerminalOptions) -> Self {
        let data = DataExchange::new(config.hidden_data_msg.clone(), true);
        TerminalCore {
            connections,
            stack: Vec::new(),
            transport: None,
            data,
            start_idx: 0,
            config,
            options,
            stop_signal: CancellationToken::new(),
            last_cmd_sent: String::new(),
            last_cmd_hidden: false,
        }
    }

    pub fn connections(&self) -> &[ConnectionSpec] {
        &self.connections
    }

    pub fn stack(&self) -> &[ShellLogin] {
        &self.stack
    }

    pub fn data_exchange(&self) -> &DataExchange {
        &self.data
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn current_prompt(&self) -> Option<&str> {
        self.stack.last().map(|s| s.prompt_found.as_str())
    }

    /// Cooperative stop flag for `record`/long-running loops.
    pub fn stop_signal(&self) -> CancellationToken {
        self.stop_signal.clone()
    }

    fn not_open_error() -> TerminalError {
        TerminalError::new(TerminalErrorKind::ConnectionNotOpen, "this terminal is not open")
    }

    fn no_hop_error() -> TerminalError {
        TerminalError::new(
            TerminalErrorKind::ConnectionNotOpen,
            "no hop is logged in yet; open() has not completed",
        )
    }

    // ---------------------------------------------------------------
    // open / close
    // ---------------------------------------------------------------

    /// Opens every configured hop in order, tearing everything back down
    /// again if any step fails.
    pub async fn open(&mut self) -> Result<(), TerminalError> {
        if self.connections.is_empty() {
            return Err(TerminalError::new(
                TerminalErrorKind::ConnectionOpen,
                "this terminal does not have any connection assigned",
            ));
        }
        match self.open_inner().await {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = self.close().await;
                Err(e)
            }
        }
    }

    async fn open_inner(&mut self) -> Result<(), TerminalError> {
        self.start_idx = self.compute_proxy_jump_prefix();
        self.open_base().await?;
        for idx in (self.start_idx + 1)..self.connections.len() {
            self.open_hop(idx).await?;
        }
        if self.options.allow_non_expected_prompt {
            if let Some(top) = self.stack.last() {
                self.connections[self.start_idx].expected_prompt = Some(top.prompt_found.clone());
            }
        }
        Ok(())
    }

    /// How many consecutive SSH hops at the head of `connections[]` collapse
    /// into one native proxy-jump chain: `idx` consecutive eligible hops
    /// yield a start index of `idx - 1` (0 when there's no chaining at
    /// all), since the chain is opened as a single socket landing on the
    /// last of those hops.
    fn compute_proxy_jump_prefix(&self) -> usize {
        if !self.options.enable_proxy_jump {
            return 0;
        }
        let count = self
            .connections
            .iter()
            .take_while(|c| c.is_ssh() && c.enable_proxy_jump)
            .count();
        count.saturating_sub(1)
    }

    async fn open_base(&mut self) -> Result<(), TerminalError> {
        let idx = self.start_idx;
        let mut channel = open_direct(&self.connections[0]).await?;
        for i in 1..=idx {
            channel = open_via_proxy_jump(channel.as_ref(), &self.connections[i])?;
        }
        channel.set_keepalive(Some(self.config.socket_keepalive_period));
        self.transport = Some(channel);
        let spec = self.connections[idx].clone();
        self.complete_hop(&spec, self.config.socket_timeout_for_login).await
    }

    /// Spawns the next hop as a typed-in-shell command on the current
    /// transport and runs its login sequence.
    async fn open_hop(&mut self, idx: usize) -> Result<(), TerminalError> {
        let spec = self.connections[idx].clone();
        let cmd = spec.spawn_command_line();
        self.send_raw(&format!("{cmd}\n")).await?;
        self.last_cmd_sent = cmd;

        let ask_list = if spec.ask_response_list.is_empty() {
            AskResponse::for_new_connection(
                spec.username.as_deref(),
                spec.password
                    .as_ref()
                    .map(|s| secrecy::ExposeSecret::expose_secret(s).to_string())
                    .as_deref(),
                spec.expanded_expected_prompt().as_deref(),
            )
        } else {
            spec.ask_response_list.clone()
        };
        self.run_ask_response_loop(
            ask_list,
            None,
            AskResponseTiming { initial_timeout: Some(self.config.socket_timeout_for_login), timeout_after_first_match: None },
        )
        .await?;

        self.complete_hop(&spec, self.config.timeout_for_prompt).await
    }

    /// Finds the new hop's banner/prompt, pushes its [`ShellLogin`], then
    /// runs the post-login bootstrap (disable history, unique prompt,
    /// flush, resize).
    async fn complete_hop(&mut self, spec: &ConnectionSpec, timeout: Duration) -> Result<(), TerminalError> {
        let previous_prompt = self.stack.last().map(|s| s.prompt_found.clone());
        let expected_pattern = spec.expanded_expected_prompt();
        let (banner, literal_prompt) = self.find_login_info(expected_pattern.as_deref(), timeout).await?;

        if let Some(prev) = &previous_prompt {
            let expected_matches = expected_pattern.as_deref().map(|p| p == literal_prompt).unwrap_or(false);
            if self.same_prompt_is_suspicious(prev, &literal_prompt, expected_matches, spec.skip_prompt_check) {
                return Err(TerminalError::new(
                    TerminalErrorKind::ExpectLogin,
                    format!("the prompt is still the same ({prev}). We might have not logged into anywhere"),
                ));
            }
        }

        let regex = Regex::new(&format!("(?im){}", regex::escape(&literal_prompt)))?;
        let mut shell = ShellLogin::new(regex, spec.os.clone());
        shell.prompt_found = literal_prompt;
        shell.banner = banner;
        shell.can_change_prompt = spec.os.can_change_prompt();
        shell.can_resize_pty = spec.os.can_resize_pty();
        shell.can_disable_history = spec.os.can_disable_history();
        shell.reset_prompt_on_exit = spec.os.reset_prompt_on_exit();
        shell.default_prompt = spec.os.default_prompt().map(str::to_string);
        shell.skip_prompt_check = spec.skip_prompt_check;
        shell.password = spec.password.clone();
        self.stack.push(shell);

        if spec.os.can_disable_history() {
            if let Some(cmd) = spec.os.disable_history() {
                self.send_cmd(&cmd, true).await?;
                self.expect_prompt(None).await?;
            }
        }

        if self.options.use_unique_prompt && spec.os.can_change_prompt() {
            let unique = spec.os.get_unique_prompt();
            self.set_prompt(&unique).await?;
        }

        self.flush_recv(true, self.config.flush_recv_timeout).await?;

        if spec.os.can_resize_pty() {
            if let Some(transport) = self.transport.as_mut() {
                let _ = transport.resize_pty(spec.cols, spec.rows).await;
            }
            let resize_cmd = spec.os.resize_pty(spec.cols, spec.rows);
            self.send_cmd(&resize_cmd, true).await?;
            self.expect_prompt(None).await?;
            self.flush_recv(true, self.config.flush_recv_timeout).await?;
        }

        Ok(())
    }

    fn same_prompt_is_suspicious(&self, prev: &str, new_prompt: &str, expected_prompt_matches: bool, skip_prompt_check: bool) -> bool {
        prev == new_prompt
            && self.options.check_same_prompt_when_opening_terminal
            && !expected_prompt_matches
            && !skip_prompt_check
            && self.stack.last().map(|s| s.can_change_prompt).unwrap_or(true)
    }

    /// Sends a newline, waits for a prompt (or the configured timeout if
    /// none was given), and splits what came back into banner text and the
    /// literal prompt string.
    async fn find_login_info(&mut self, expected_prompt_pattern: Option<&str>, timeout: Duration) -> Result<(String, String), TerminalError> {
        let prompt_regex = match expected_prompt_pattern {
            Some(p) => Some(Regex::new(&format!("(?im){p}"))?),
            None => None,
        };
        self.send_raw("\n").await?;
        let (data, timer_expired, prompt_found) = self.find_prompt(prompt_regex.as_ref(), timeout).await?;

        if data.is_empty() {
            return Err(TerminalError::new(TerminalErrorKind::ExpectLogin, "did not get any banner message or prompt"));
        }

        let mut lines: Vec<&str> = data.lines().collect();
        let fallback_last_line = lines.pop().unwrap_or("").to_string();
        let literal_prompt = prompt_found.unwrap_or(fallback_last_line);
        let literal_prompt = literal_prompt.trim_end_matches(['\r', '\n']).to_string();

        if expected_prompt_pattern.is_some() && timer_expired && !self.options.allow_non_expected_prompt {
            return Err(TerminalError::new(
                TerminalErrorKind::ExpectLogin,
                format!(
                    "the expected prompt {} is different to the one we got ({literal_prompt}). we might be in the wrong place or the expected prompt is wrong",
                    expected_prompt_pattern.unwrap_or("")
                ),
            ));
        }

        let banner = match data.find(literal_prompt.as_str()) {
            Some(pos) if pos > 0 => data[..pos].to_string(),
            _ => String::new(),
        };

        Ok((banner, literal_prompt))
    }

    /// Polls `recv` until `prompt_regex` matches (when given) or `timeout`
    /// elapses. Always respects an overall deadline even while data keeps
    /// streaming in, rather than looping indefinitely whenever
    /// `prompt_regex` is set and data keeps arriving without matching.
    async fn find_prompt(&mut self, prompt_regex: Option<&Regex>, timeout: Duration) -> Result<(String, bool, Option<String>), TerminalError> {
        let mut data_received = String::new();
        let mut prompt_found = None;
        let mut timer_expired = true;
        let deadline = Instant::now() + timeout;

        loop {
            if self.stop_signal.is_cancelled() {
                break;
            }
            if let Some(chunk) = self.recv_once(self.config.buffer_size).await? {
                data_received.push_str(&chunk);
                if let Some(re) = prompt_regex {
                    if let Some(m) = re.find(&data_received) {
                        prompt_found = Some(m.as_str().to_string());
                        timer_expired = false;
                        break;
                    }
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(self.config.socket_time_sleep_no_data).await;
        }

        Ok((data_received, timer_expired, prompt_found))
    }

    /// Reverses the stack: sends each hop's exit command, restores a
    /// default prompt where applicable, and (unless `close_base_on_exit`
    /// is false) tears down the base transport. Idempotent: calling this on
    /// an already-closed terminal is a no-op.
    pub async fn close(&mut self) -> Result<(), TerminalError> {
        while let Some(shell) = self.stack.pop() {
            let _ = self.send_cmd(shell.os.exit_cmd(), true).await;
            if self.options.use_unique_prompt && shell.can_change_prompt && shell.reset_prompt_on_exit {
                if let Some(default_prompt) = shell.default_prompt.clone() {
                    if let Some(cmd) = shell.os.set_prompt(&default_prompt) {
                        if let Err(e) = self.send_cmd(&cmd, false).await {
                            tracing::warn!(error = %e, prompt = %default_prompt, "failed to reset prompt on close");
                        }
                    }
                }
            }
        }
        self.last_cmd_sent.clear();
        if self.options.close_base_on_exit {
            if let Some(mut transport) = self.transport.take() {
                transport.close().await?;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // send / recv primitives
    // ---------------------------------------------------------------

    async fn send_raw(&mut self, text: &str) -> Result<(), TerminalError> {
        let transport = self.transport.as_mut().ok_or_else(Self::not_open_error)?;
        transport.send(text).await
    }

    async fn recv_once(&mut self, buf_size: usize) -> Result<Option<String>, TerminalError> {
        let transport = self.transport.as_mut().ok_or_else(Self::not_open_error)?;
        match transport.recv(buf_size).await? {
            RecvStatus::Data(text) => {
                let stripped = rlogin_core::strip_ansi(&text);
                self.data.new_received(&stripped);
                Ok(Some(stripped))
            }
            RecvStatus::NotReady => Ok(None),
            RecvStatus::Closed => Err(TerminalError::new(TerminalErrorKind::ConnectionNotOpen, "remote end closed the connection")),
        }
    }

    /// Sends `text`, trimmed and newline-terminated when `new_line`, and
    /// records it in the transcript (redacted when `hidden`).
    pub async fn send(&mut self, text: &str, new_line: bool, hidden: bool, title: Option<&str>) -> Result<(), TerminalError> {
        let mut cmd = text.trim_end_matches(['\r', '\n']).to_string();
        if new_line {
            cmd.push('\n');
        }
        self.send_raw(&cmd).await?;
        self.last_cmd_sent = cmd.trim_end_matches('\n').to_string();
        self.last_cmd_hidden = hidden;
        self.data.new_sent(&cmd, hidden, title);
        Ok(())
    }

    /// Sends a visible command, flushing any stray prior output first.
    pub async fn send_cmd(&mut self, cmd: &str, flush: bool) -> Result<(), TerminalError> {
        if flush && !self.last_cmd_sent.is_empty() {
            self.flush_recv(true, self.config.flush_recv_timeout).await?;
        }
        self.send(cmd, true, false, None).await
    }

    /// Sends a hidden command (e.g. a password), redacted in the transcript.
    pub async fn send_hidden_cmd(&mut self, cmd: &str, flush: bool) -> Result<(), TerminalError> {
        if flush && !self.last_cmd_sent.is_empty() {
            self.flush_recv(true, self.config.flush_recv_timeout).await?;
        }
        self.send(cmd, true, true, Some("hidden")).await
    }

    /// `Ctrl-C`: sent raw, never recorded as a "command" since it has no
    /// textual form.
    pub async fn send_ctrl_c(&mut self) -> Result<(), TerminalError> {
        self.send_raw("\x03").await?;
        self.data.new_sent("^C", false, Some("control"));
        Ok(())
    }

    pub async fn send_line(&mut self, text: &str) -> Result<(), TerminalError> {
        self.send_cmd(text, true).await
    }

    /// Drains whatever the remote has buffered without blocking on a
    /// match, giving up after `timeout`. If data kept arriving right up to
    /// the deadline and `force_ctrl_c` is set, sends one `Ctrl-C` and
    /// drains once more (non-recursively) to clear whatever that
    /// interrupted.
    pub async fn flush_recv(&mut self, mut force_ctrl_c: bool, timeout: Duration) -> Result<(), TerminalError> {
        loop {
            let deadline = Instant::now() + timeout;
            let mut had_data = false;
            loop {
                match self.recv_once(self.config.buffer_size).await {
                    Ok(Some(_)) => had_data = true,
                    Ok(None) => break,
                    Err(_) => break,
                }
                if Instant::now() >= deadline {
                    break;
                }
            }
            if !had_data {
                return Ok(());
            }
            if Instant::now() >= deadline && force_ctrl_c {
                self.send_raw("\x03").await?;
                force_ctrl_c = false;
                continue;
            }
            return Ok(());
        }
    }

    // ---------------------------------------------------------------
    // expect
    // ---------------------------------------------------------------

    /// Scans incoming data against `contract` until it's satisfied or
    /// `opts.timeout` elapses: checks the last receive first, then polls
    /// `recv` in a loop, optionally re-syncing to the start of the current
    /// line after each chunk.
    pub async fn expect(&mut self, mut contract: ExpectContract, opts: ExpectOptions) -> Result<ExpectContract, TerminalError> {
        let prompt_regex = self.stack.last().map(|s| s.expected_prompt.clone());
        let buffer_size = opts.buffer_size.unwrap_or(self.config.buffer_size);

        let mut buf = if opts.reset_buffer {
            String::new()
        } else {
            self.data.get_last_recv().unwrap_or_default().to_string()
        };

        if !buf.is_empty() && contract.scan(&buf, prompt_regex.as_ref()).ok {
            return Ok(contract);
        }

        contract.reset();
        let timeout = opts.timeout.unwrap_or(self.config.timeout_for_prompt);
        let deadline = Instant::now() + timeout;

        loop {
            if self.stop_signal.is_cancelled() {
                break;
            }
            if Instant::now() >= deadline {
                break;
            }
            match self.recv_once(buffer_size).await {
                Ok(Some(chunk)) => {
                    buf.push_str(&chunk);
                    if contract.scan(&buf, prompt_regex.as_ref()).ok {
                        return Ok(contract);
                    }
                    if opts.reset_on_new_line {
                        if let Some(pos) = buf.rfind('\n') {
                            buf = buf[pos + 1..].to_string();
                        }
                    }
                }
                Ok(None) => {
                    tokio::time::sleep(self.config.socket_time_sleep_no_data).await;
                }
                Err(e) => return Err(e),
            }
        }

        let tail = tail_chars(&buf, self.config.buffer_size_to_return_when_error);
        let tail = if self.last_cmd_hidden && !self.last_cmd_sent.is_empty() {
            tail.replace(&self.last_cmd_sent, &self.config.hidden_data_msg)
        } else {
            tail
        };
        Err(TerminalError::timeout(format!(
            "failed to match expected pattern(s) before timeout of {timeout:?}; last {} chars received:\n{tail}",
            self.config.buffer_size_to_return_when_error
        )))
    }

    /// Convenience wrapper: a one-pattern contract matching only the
    /// current hop's prompt.
    pub async fn expect_prompt(&mut self, timeout: Option<Duration>) -> Result<ExpectContract, TerminalError> {
        let mut contract = ExpectContract::new(MatchPolicy::Any);
        contract.add(PatternValue::new_prompt("prompt"))?;
        self.expect(contract, ExpectOptions { timeout, reset_buffer: true, ..Default::default() }).await
    }

    /// Runs a multi-step login negotiation: waits for each active step's
    /// pattern, sends its response (or stops, for a response-less prompt
    /// step), and retires steps once they've matched enough times.
    pub async fn run_ask_response_loop(
        &mut self,
        mut active: Vec<AskResponse>,
        stop_after_getting: Option<&[&str]>,
        timing: AskResponseTiming,
    ) -> Result<HashMap<String, AskResponse>, TerminalError> {
        let mut matched: HashMap<String, AskResponse> = HashMap::new();
        let mut timeout = timing.initial_timeout;
        let mut matched_once = false;

        while !active.is_empty() {
            let mut contract = ExpectContract::new(MatchPolicy::Any);
            for step in &active {
                let pattern = match &step.expect {
                    Some(p) => PatternValue::new_regex(step.name.clone(), p)?,
                    None => PatternValue::new_prompt(step.name.clone()),
                };
                contract.add(pattern)?;
            }

            let result = match self.expect(contract, ExpectOptions { timeout, reset_buffer: false, ..Default::default() }).await {
                Ok(c) => c,
                Err(e) if e.kind == TerminalErrorKind::ExpectTimeout => {
                    let names: Vec<&str> = active.iter().map(|s| s.name.as_str()).collect();
                    return Err(TerminalError::new(
                        TerminalErrorKind::ExpectLogin,
                        format!("login sequence timed out waiting for one of {names:?}: {}", e.message),
                    ));
                }
                Err(e) => return Err(e),
            };

            let idx = active
                .iter()
                .position(|s| result.get(&s.name).map(PatternValue::is_matched).unwrap_or(false))
                .ok_or_else(|| TerminalError::new(TerminalErrorKind::ExpectLogin, "ask/response loop matched but no step could be identified"))?;

            let (enough, cont) = active[idx].match_found();
            let name = active[idx].name.clone();
            let response = active[idx].response.clone();
            let hidden = active[idx].hidden;

            if enough {
                matched.insert(name.clone(), active[idx].clone());
            }
            if !cont {
                active.remove(idx);
            }

            match response {
                None => break,
                Some(reply) => {
                    if hidden {
                        self.send_hidden_cmd(&reply, true).await?;
                    } else {
                        self.send_cmd(&reply, true).await?;
                    }
                }
            }

            let any_required_left = active.iter().any(|s| s.required);
            let stop_hit = stop_after_getting.map(|names| names.contains(&name.as_str())).unwrap_or(false);
            if stop_hit || !any_required_left {
                break;
            }

            if !matched_once {
                matched_once = true;
                if let Some(t) = timing.timeout_after_first_match {
                    timeout = Some(t);
                }
            }
        }

        Ok(matched)
    }

    // ---------------------------------------------------------------
    // check_output / sudo
    // ---------------------------------------------------------------

    /// Flushes stray output, sends `cmd` (optionally sudo-prefixed and/or
    /// with stderr redirected to a temp file), waits for the prompt, and
    /// returns the command's output with the echoed command line stripped.
    pub async fn check_output(&mut self, cmd: &str, use_sudo: bool, stderr_to_tmp: bool) -> Result<String, TerminalError> {
        if cmd.is_empty() {
            return Err(TerminalError::new(TerminalErrorKind::CommandNotProvided, "check_output requires a non-empty command"));
        }
        self.flush_recv(true, self.config.flush_recv_timeout).await?;
        let os = self.stack.last().ok_or_else(Self::no_hop_error)?.os.clone();

        let mut full_cmd = cmd.to_string();
        if stderr_to_tmp {
            let digest = rlogin_transfer::md5_hex(cmd.as_bytes());
            let err_file = format!("/tmp/.stderr_{}", &digest[..12]);
            if let Some(stripped) = full_cmd.strip_suffix('&').map(str::trim_end) {
                full_cmd = format!("{stripped} 2>{err_file} &");
            } else {
                full_cmd = format!("{full_cmd} 2>{err_file}");
            }
        }
        if use_sudo {
            if let Some(prefix) = os.sudo_prefix() {
                if !full_cmd.trim_start().starts_with(prefix.trim()) {
                    full_cmd = format!("{prefix}{full_cmd}");
                }
            }
        }

        self.send_cmd(&full_cmd, true).await?;

        let result = if use_sudo && os.sudo_prefix().is_some() {
            let mut contract = ExpectContract::new(MatchPolicy::Any);
            contract.add(PatternValue::new_regex("password", os.sudo_password_prompt())?)?;
            contract.add(PatternValue::new_prompt("prompt"))?;
            let first = self
                .expect(contract, ExpectOptions { reset_buffer: true, ..Default::default() })
                .await
                .map_err(|e| self.to_called_process_error(&full_cmd, e))?;
            if first.get("password").map(PatternValue::is_matched).unwrap_or(false) {
                let password = self.current_hop_password();
                self.send_hidden_cmd(&password, false).await?;
                self.expect_prompt(None).await.map_err(|e| self.to_called_process_error(&full_cmd, e))?
            } else {
                first
            }
        } else {
            self.expect_prompt(None).await.map_err(|e| self.to_called_process_error(&full_cmd, e))?
        };

        let text_before = result.get("prompt").and_then(PatternValue::text_before_match).unwrap_or("").to_string();
        let mut output = text_before.trim_matches('\n').to_string();
        if let Some(pos) = output.find(&full_cmd) {
            output = output[pos + full_cmd.len()..].trim_start_matches(['\r', '\n']).to_string();
        }
        Ok(output)
    }

    /// Convenience entry point for `check_output` under sudo.
    pub async fn send_sudo_cmd(&mut self, cmd: &str) -> Result<String, TerminalError> {
        self.check_output(cmd, true, false).await
    }

    fn to_called_process_error(&self, cmd: &str, e: TerminalError) -> TerminalError {
        let output = tail_chars(self.data.get_last_recv().unwrap_or(""), self.config.buffer_size_to_return_when_error);
        TerminalError::called_process(cmd, -1, format!("did not find the prompt after sending this command ({e}). last output: {output}"))
    }

    fn current_hop_password(&self) -> String {
        self.stack
            .last()
            .and_then(|s| s.password.as_ref())
            .map(|p| p.expose_secret().to_string())
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------
    // prompt management
    // ---------------------------------------------------------------

    /// Changes the current hop's prompt and confirms the new one is live.
    /// A no-op if `new_prompt` already matches the current literal prompt.
    pub async fn set_prompt(&mut self, new_prompt: &str) -> Result<(), TerminalError> {
        let (os, current_prompt) = {
            let shell = self.stack.last().ok_or_else(Self::no_hop_error)?;
            (shell.os.clone(), shell.prompt_found.clone())
        };
        if new_prompt == current_prompt {
            return Ok(());
        }
        if let Some(cmd) = os.set_prompt(new_prompt) {
            self.send_cmd(&cmd, true).await?;
        }
        self.send_raw("\n").await?;
        self.get_new_prompt(Some(new_prompt), self.config.timeout_for_prompt).await?;
        Ok(())
    }

    /// Waits for `new_prompt` (or, if `None`, just the timeout) and updates
    /// the current hop's `expected_prompt`/`prompt_found` to what was
    /// actually observed.
    pub async fn get_new_prompt(&mut self, new_prompt: Option<&str>, timeout: Duration) -> Result<String, TerminalError> {
        let regex = match new_prompt {
            Some(p) => Some(Regex::new(&format!("(?im){p}"))?),
            None => None,
        };
        let (data, _timer_expired, prompt_found) = self.find_prompt(regex.as_ref(), timeout).await?;

        if data.is_empty() || (new_prompt.is_some() && prompt_found.is_none()) {
            let mut msg = match new_prompt {
                Some(p) if !data.is_empty() => format!(
                    "prompt was not found for cmd ({}). expected ({p}) but last line was ({})",
                    display_last_cmd(&self.last_cmd_sent),
                    data.lines().last().unwrap_or("")
                ),
                Some(p) => format!("prompt was not found for cmd ({}). expected ({p}) but got no data", display_last_cmd(&self.last_cmd_sent)),
                None => data.clone(),
            };
            if self.last_cmd_hidden && !self.last_cmd_sent.is_empty() {
                msg = msg.replace(&self.last_cmd_sent, &self.config.hidden_data_msg);
            }
            return Err(TerminalError::prompt_not_found(msg));
        }

        let literal = prompt_found.unwrap_or_else(|| data.lines().last().unwrap_or("").to_string());
        let literal = literal.trim_end_matches(['\r', '\n']).to_string();
        let escaped = regex::escape(&literal);
        if let Some(shell) = self.stack.last_mut() {
            shell.expected_prompt = Regex::new(&format!("(?im){escaped}"))?;
            shell.prompt_found = literal;
        }
        Ok(escaped)
    }

    /// Re-confirms the current hop is still at its known prompt (or a
    /// freshly changed one), raising if it isn't found within `timeout`.
    pub async fn expect_new_prompt(&mut self, new_prompt: Option<&str>, timeout: Duration) -> Result<(), TerminalError> {
        self.get_new_prompt(new_prompt, timeout).await.map(|_| ())
    }

    // ---------------------------------------------------------------
    // record
    // ---------------------------------------------------------------

    /// Drains incoming data verbatim (no match-seeking) until `timeout`
    /// elapses or [`Self::stop_signal`] is cancelled.
    pub async fn record(&mut self, timeout: Option<Duration>) -> Result<String, TerminalError> {
        let mut out = String::new();
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if self.stop_signal.is_cancelled() {
                break;
            }
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    break;
                }
            }
            match self.recv_once(self.config.buffer_size).await {
                Ok(Some(chunk)) => out.push_str(&chunk),
                Ok(None) => tokio::time::sleep(self.config.socket_time_sleep_no_data).await,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    pub(crate) fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub(crate) fn current_hop_os(&self) -> Result<std::sync::Arc<dyn rlogin_os::OsAdapter>, TerminalError> {
        self.stack.last().map(|s| s.os.clone()).ok_or_else(Self::no_hop_error)
    }

    /// Whether the current hop is the base connection (`stack.len() == 1`),
    /// the only case [`crate::transfer`] will attempt a native file
    /// transfer instead of the base64-over-terminal fallback: only the
    /// base hop might have a native SFTP/SCP path reachable.
    pub(crate) fn is_base_hop(&self) -> bool {
        self.stack.len() <= 1
    }

    pub(crate) fn transport_mut(&mut self) -> Result<&mut Box<dyn Channel>, TerminalError> {
        self.transport.as_mut().ok_or_else(Self::not_open_error)
    }

    /// Sends `cmd`, then polls `recv` until the current prompt shows up or
    /// `timeout` elapses, handing every raw (ANSI-stripped) chunk to `sink`
    /// as it arrives. Used by the base64 `get_file` fallback so a
    /// [`rlogin_transfer::Base64StreamDecoder`] can decode output
    /// incrementally instead of buffering the whole encoded file in memory.
    pub(crate) async fn send_and_stream(
        &mut self,
        cmd: &str,
        timeout: Duration,
        mut sink: impl FnMut(&str),
    ) -> Result<(), TerminalError> {
        self.send_cmd(cmd, true).await?;

        let prompt_regex = self.stack.last().map(|s| s.expected_prompt.clone());
        let mut buf = String::new();
        let deadline = Instant::now() + timeout;
        let mut contract = ExpectContract::new(MatchPolicy::Any);
        contract.add(PatternValue::new_prompt("prompt"))?;

        loop {
            if self.stop_signal.is_cancelled() {
                break;
            }
            if Instant::now() >= deadline {
                break;
            }
            match self.recv_once(self.config.buffer_size).await {
                Ok(Some(chunk)) => {
                    sink(&chunk);
                    buf.push_str(&chunk);
                    if contract.scan(&buf, prompt_regex.as_ref()).ok {
                        return Ok(());
                    }
                }
                Ok(None) => tokio::time::sleep(self.config.socket_time_sleep_no_data).await,
                Err(e) => return Err(e),
            }
        }

        Err(TerminalError::timeout(format!("'{cmd}' did not reach the prompt before timeout of {timeout:?}")))
    }
}

#[cfg(any(test, feature = "test-support"))]
impl TerminalCore {
    /// Test-only seam: installs a transport directly instead of running
    /// `open`, so scenario tests can drive a fake channel without a real
    /// network fixture.
    pub fn set_transport_for_test(&mut self, channel: Box<dyn Channel>) {
        self.transport = Some(channel);
    }

    /// Test-only seam: pushes a logged-in hop directly.
    pub fn push_shell_for_test(&mut self, prompt_regex: &str, os: std::sync::Arc<dyn rlogin_os::OsAdapter>) {
        self.stack.push(crate::shell_login::ShellLogin::new(Regex::new(&format!("(?im){prompt_regex}")).unwrap(), os));
    }
}

fn tail_chars(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();
    if total <= max_chars {
        return s.to_string();
    }
    s.chars().skip(total - max_chars).collect()
}

fn display_last_cmd(last: &str) -> &str {
    if last.is_empty() {
        "PROMPT"
    } else {
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlogin_channel::test_support::FakeChannel;
    use rlogin_channel::Protocol;
    use rlogin_os::UnixAdapter;
    use std::sync::Arc;

    fn spec() -> ConnectionSpec {
        ConnectionSpec::new(Protocol::LocalSubprocess, Arc::new(UnixAdapter::default()))
            .with_username("alice")
            .with_password("s3cret")
            .with_expected_prompt(r"\$\s*$")
    }

    fn new_core() -> TerminalCore {
        TerminalCore::new(vec![spec()], TerminalConfig::default(), TerminalOptions::default())
    }

    #[tokio::test]
    async fn send_records_transcript_and_redacts_hidden() {
        let mut core = new_core();
        core.transport = Some(Box::new(FakeChannel::new()));
        core.send("whoami", true, false, None).await.unwrap();
        core.send("s3cret", true, true, Some("password")).await.unwrap();
        let convo = core.data_exchange().get_conversation_list();
        assert!(convo.contains(&"whoami\n"));
        assert!(convo.iter().any(|e| *e == core.config().hidden_data_msg));
    }

    #[tokio::test]
    async fn expect_prompt_matches_immediately_from_last_recv() {
        let mut core = new_core();
        core.transport = Some(Box::new(FakeChannel::new().push_recv("alice@host:~$ ")));
        core.stack.push(ShellLogin::new(Regex::new(r"(?im)\$\s*$").unwrap(), Arc::new(UnixAdapter::default())));
        core.recv_once(4096).await.unwrap();
        let result = core.expect_prompt(Some(Duration::from_millis(200))).await.unwrap();
        assert!(result.get("prompt").unwrap().is_matched());
    }

    #[tokio::test]
    async fn expect_times_out_and_redacts_hidden_command() {
        let mut core = new_core();
        core.transport = Some(Box::new(FakeChannel::new()));
        core.stack.push(ShellLogin::new(Regex::new(r"(?im)\$\s*$").unwrap(), Arc::new(UnixAdapter::default())));
        core.last_cmd_sent = "s3cret".to_string();
        core.last_cmd_hidden = true;
        let mut contract = ExpectContract::new(MatchPolicy::Any);
        contract.add(PatternValue::new_regex("never", "nope").unwrap()).unwrap();
        let err = core
            .expect(contract, ExpectOptions { timeout: Some(Duration::from_millis(80)), ..Default::default() })
            .await
            .unwrap_err();
        assert_eq!(err.kind, TerminalErrorKind::ExpectTimeout);
    }

    #[tokio::test]
    async fn run_ask_response_loop_sends_password_then_stops_at_prompt() {
        let mut core = new_core();
        core.transport = Some(Box::new(FakeChannel::new().push_recv("Password: ").push_recv("alice@host:~$ ")));
        core.stack.push(ShellLogin::new(Regex::new(r"(?im)\$\s*$").unwrap(), Arc::new(UnixAdapter::default())));

        let steps = AskResponse::for_new_connection(None, Some("s3cret"), Some(r"\$\s*$"));
        let matched = core
            .run_ask_response_loop(steps, None, AskResponseTiming { initial_timeout: Some(Duration::from_millis(500)), timeout_after_first_match: None })
            .await
            .unwrap();
        assert!(matched.contains_key("password"));
        let convo = core.data_exchange().get_conversation_list();
        assert!(convo.iter().any(|e| e.contains("s3cret")));
    }
}
