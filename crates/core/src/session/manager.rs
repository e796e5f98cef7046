use std::collections::VecDeque;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use wallet_protocol::{AddEthereumChainParameter, ProviderEvent, RequestArguments, UNRECOGNIZED_CHAIN, normalize_address, parse_accounts, parse_chain_id};

use super::notice::SessionNotice;
use super::state::SessionState;
use crate::catalog::{self, WALLETCONNECT_ID, WalletDescriptor};
use crate::config::WalletConfig;
use crate::environment::{Timer, WalletEnvironment};
use crate::error::{Result, WalletError};
use crate::handlers::Subscription;
use crate::pairing::{self, enable_with_retry};
use crate::provider::ProviderRef;

const NOTICE_CAPACITY: usize = 32;

enum Command {
	Connect {
		descriptor: WalletDescriptor,
		reply: oneshot::Sender<Result<()>>,
	},
	Disconnect {
		reply: oneshot::Sender<()>,
	},
	SwitchNetwork {
		chain_id: u64,
		reply: oneshot::Sender<Result<()>>,
	},
	Restore {
		reply: oneshot::Sender<Result<bool>>,
	},
}

impl Command {
	/// Answers a command that will never run.
	fn cancel(self) {
		match self {
			Command::Connect { reply, .. } | Command::SwitchNetwork { reply, .. } => {
				let _ = reply.send(Err(WalletError::Cancelled));
			}
			Command::Disconnect { reply } => {
				let _ = reply.send(());
			}
			Command::Restore { reply } => {
				let _ = reply.send(Err(WalletError::Cancelled));
			}
		}
	}
}

enum Message {
	Command(Command),
	/// Forwarded by a provider listener registered under `generation`.
	Provider { generation: u64, event: ProviderEvent },
}

/// Account and chain read back from a freshly connected provider.
struct Established {
	address: Option<String>,
	chain_id: Option<u64>,
}

/// Entry point: builds a handle and the driver that owns the state.
pub struct SessionManager;

impl SessionManager {
	/// Creates the session pair. Spawn [`SessionDriver::run`] on a local task
	/// set; the handle is inert until it runs.
	pub fn new(env: WalletEnvironment, config: WalletConfig) -> (SessionHandle, SessionDriver) {
		let (tx, rx) = mpsc::unbounded_channel();
		let (state_tx, state_rx) = watch::channel(SessionState::default());
		let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

		let driver = SessionDriver {
			env,
			config,
			events: tx.downgrade(),
			rx,
			backlog: VecDeque::new(),
			state: state_tx,
			notices: notices.clone(),
			generation: 0,
			subscription: None,
		};
		let handle = SessionHandle {
			tx,
			state: state_rx,
			notices,
		};
		(handle, driver)
	}
}

/// Cloneable operation surface of the session.
///
/// Mutating operations are queued to the driver and run one at a time, in
/// call order. The exception is [`disconnect`](Self::disconnect): it cuts
/// short a running connect, restore or network switch, and cancels whatever
/// was queued behind it.
#[derive(Clone)]
pub struct SessionHandle {
	tx: mpsc::UnboundedSender<Message>,
	state: watch::Receiver<SessionState>,
	notices: broadcast::Sender<SessionNotice>,
}

impl SessionHandle {
	/// Connects the catalog entry `wallet_id`.
	pub async fn connect(&self, wallet_id: &str) -> Result<()> {
		let descriptor = catalog::find(wallet_id).ok_or_else(|| WalletError::UnknownWallet(wallet_id.to_string()))?;
		self.connect_with(descriptor.clone()).await
	}

	/// Connects through `descriptor`'s provider factory.
	///
	/// Replaces any existing session. On failure the state is reset, a
	/// [`SessionNotice::ConnectFailed`] is published and the classified error
	/// is returned.
	pub async fn connect_with(&self, descriptor: WalletDescriptor) -> Result<()> {
		let (reply, rx) = oneshot::channel();
		self.send(Command::Connect { descriptor, reply })?;
		rx.await.map_err(|_| WalletError::ManagerClosed)?
	}

	/// Connect without choosing a wallet: only asks the user to pick one.
	pub fn connect_wallet(&self) {
		let _ = self.notices.send(SessionNotice::SelectWallet);
	}

	/// Ends the session. The state is reset even when the provider's own
	/// disconnect fails.
	///
	/// An operation still in flight is abandoned and resolves to
	/// [`WalletError::Cancelled`].
	pub async fn disconnect(&self) -> Result<()> {
		let (reply, rx) = oneshot::channel();
		self.send(Command::Disconnect { reply })?;
		rx.await.map_err(|_| WalletError::ManagerClosed)
	}

	/// Asks the wallet to switch to `chain_id`, registering Ethereum mainnet
	/// parameters first if the wallet does not know the chain.
	///
	/// # Errors
	///
	/// [`WalletError::NotConnected`] without a connected provider; otherwise
	/// the classified provider failure. Connection state is left unchanged.
	pub async fn switch_network(&self, chain_id: u64) -> Result<()> {
		let (reply, rx) = oneshot::channel();
		self.send(Command::SwitchNetwork { chain_id, reply })?;
		rx.await.map_err(|_| WalletError::ManagerClosed)?
	}

	/// Re-attaches a remote pairing session that is still live, e.g. after a
	/// page reload.
	///
	/// Initializes the pairing provider and, if it reports a connected peer
	/// with accounts, moves to connected without prompting. Returns `false`
	/// when there is nothing to restore, no pairing client, or a session is
	/// already active. No notices are published.
	pub async fn restore(&self) -> Result<bool> {
		let (reply, rx) = oneshot::channel();
		self.send(Command::Restore { reply })?;
		rx.await.map_err(|_| WalletError::ManagerClosed)?
	}

	/// Reads the balance of `address` (hex wei) from the active provider.
	///
	/// Read-only, so it bypasses the operation queue. `None` when there is no
	/// provider or the request fails.
	pub async fn get_balance(&self, address: &str) -> Option<String> {
		let provider = self.state.borrow().provider.clone()?;
		match provider.request(RequestArguments::get_balance(address)).await {
			Ok(balance) => balance.as_str().map(str::to_string),
			Err(err) => {
				warn!(target = "wallet.session", error = %err, "failed to get balance");
				None
			}
		}
	}

	/// Current state snapshot.
	pub fn state(&self) -> SessionState {
		self.state.borrow().clone()
	}

	/// Receiver notified on every state change.
	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state.clone()
	}

	pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
		self.notices.subscribe()
	}

	fn send(&self, command: Command) -> Result<()> {
		self.tx.send(Message::Command(command)).map_err(|_| WalletError::ManagerClosed)
	}
}

/// Owns [`SessionState`] and applies commands and provider events in order.
pub struct SessionDriver {
	env: WalletEnvironment,
	config: WalletConfig,
	events: mpsc::WeakUnboundedSender<Message>,
	rx: mpsc::UnboundedReceiver<Message>,
	/// Messages read while an operation was running, in arrival order.
	backlog: VecDeque<Message>,
	state: watch::Sender<SessionState>,
	notices: broadcast::Sender<SessionNotice>,
	generation: u64,
	subscription: Option<Subscription>,
}

impl SessionDriver {
	/// Processes messages until every [`SessionHandle`] is dropped.
	///
	/// Each message is handled to completion before the next one is read, so
	/// provider events never interleave with a running operation. Only a
	/// `disconnect` is looked at early.
	pub async fn run(mut self) {
		debug!(target = "wallet.session", "session driver started");
		while let Some(message) = self.next_message().await {
			match message {
				Message::Command(command) => self.handle_command(command).await,
				Message::Provider { generation, event } => self.handle_event(generation, event),
			}
		}
		self.subscription = None;
		debug!(target = "wallet.session", "session driver stopped");
	}

	async fn next_message(&mut self) -> Option<Message> {
		match self.backlog.pop_front() {
			Some(message) => Some(message),
			None => self.rx.recv().await,
		}
	}

	async fn handle_command(&mut self, command: Command) {
		match command {
			Command::Connect { descriptor, reply } => {
				let result = self.connect(descriptor).await;
				let _ = reply.send(result);
			}
			Command::Disconnect { reply } => {
				self.disconnect().await;
				let _ = reply.send(());
			}
			Command::SwitchNetwork { chain_id, reply } => {
				let result = self.switch_network(chain_id).await;
				let _ = reply.send(result);
			}
			Command::Restore { reply } => {
				let result = self.restore().await;
				let _ = reply.send(result);
			}
		}
	}

	/// Drives `operation` while still reading the queue.
	///
	/// Other messages are parked in the backlog. A `disconnect` stops the
	/// operation and hands back its reply channel.
	async fn unless_disconnected<F: Future>(&mut self, operation: F) -> std::result::Result<F::Output, oneshot::Sender<()>> {
		let mut operation = pin!(operation);
		loop {
			tokio::select! {
				biased;
				output = &mut operation => return Ok(output),
				Some(message) = self.rx.recv() => match message {
					Message::Command(Command::Disconnect { reply }) => return Err(reply),
					message => self.backlog.push_back(message),
				},
			}
		}
	}

	/// Disconnects in place of the abandoned operation. Commands queued
	/// before the disconnect are cancelled so the session ends disconnected.
	async fn preempt(&mut self, provider: Option<ProviderRef>, reply: oneshot::Sender<()>) {
		info!(target = "wallet.session", "disconnect requested mid-operation; abandoning it");
		for message in std::mem::take(&mut self.backlog) {
			match message {
				Message::Command(command) => command.cancel(),
				event => self.backlog.push_back(event),
			}
		}
		self.disconnect_from(provider).await;
		let _ = reply.send(());
	}

	async fn connect(&mut self, descriptor: WalletDescriptor) -> Result<()> {
		info!(target = "wallet.session", wallet = descriptor.id, "connecting");
		self.subscription = None;
		self.generation += 1;
		self.state.send_replace(SessionState {
			is_loading: true,
			selected_wallet: Some(descriptor.clone()),
			..SessionState::default()
		});

		let env = self.env.clone();
		let config = self.config.clone();
		let outcome = self.unless_disconnected(descriptor.connect_provider(&env, &config)).await;
		let provider = match outcome {
			Ok(Ok(provider)) => provider,
			Ok(Err(error)) => return Err(self.connect_failed(&descriptor, error)),
			Err(reply) => {
				self.preempt(None, reply).await;
				return Err(WalletError::Cancelled);
			}
		};
		self.subscription = Some(self.listen(&provider));

		let outcome = self.unless_disconnected(handshake(&provider, descriptor.is_remote(), env.timer(), &config)).await;
		let established = match outcome {
			Ok(Ok(established)) => established,
			Ok(Err(error)) => return Err(self.connect_failed(&descriptor, error)),
			Err(reply) => {
				self.preempt(Some(provider), reply).await;
				return Err(WalletError::Cancelled);
			}
		};

		let pending = established.address.is_none();
		info!(
			target = "wallet.session",
			wallet = descriptor.id,
			address = established.address.as_deref().unwrap_or("<pending>"),
			chain_id = ?established.chain_id,
			"connected"
		);
		self.state.send_modify(|state| {
			state.connected = true;
			state.address = established.address;
			state.chain_id = established.chain_id;
			state.provider = Some(provider);
			state.is_loading = false;
		});
		let notice = if pending {
			SessionNotice::PairingPending
		} else {
			SessionNotice::Connected { wallet: descriptor.name }
		};
		self.notify(notice);
		Ok(())
	}

	fn connect_failed(&mut self, descriptor: &WalletDescriptor, error: WalletError) -> WalletError {
		warn!(target = "wallet.session", wallet = descriptor.id, error = %error, kind = error.kind(), "connect failed");
		self.reset();
		self.notify(SessionNotice::ConnectFailed {
			wallet: descriptor.name,
			error: error.clone(),
		});
		error
	}

	async fn restore(&mut self) -> Result<bool> {
		if self.env.pairing().is_none() || self.state.borrow().provider.is_some() {
			return Ok(false);
		}
		let Some(descriptor) = catalog::find(WALLETCONNECT_ID).cloned() else {
			return Ok(false);
		};

		let env = self.env.clone();
		let config = self.config.clone();
		let outcome = self.unless_disconnected(pairing::init_provider(&env, &config)).await;
		let provider = match outcome {
			Ok(result) => result.inspect_err(|err| warn!(target = "wallet.session", error = %err, "pairing init failed; nothing restored"))?,
			Err(reply) => {
				self.preempt(None, reply).await;
				return Err(WalletError::Cancelled);
			}
		};

		let outcome = self.unless_disconnected(live_session(&provider)).await;
		let live = match outcome {
			Ok(result) => result.inspect_err(|err| warn!(target = "wallet.session", error = %err, "failed to read existing pairing session"))?,
			Err(reply) => {
				self.preempt(Some(provider), reply).await;
				return Err(WalletError::Cancelled);
			}
		};
		let Some(established) = live else {
			debug!(target = "wallet.session", "no live pairing session to restore");
			return Ok(false);
		};

		info!(
			target = "wallet.session",
			address = established.address.as_deref().unwrap_or_default(),
			chain_id = ?established.chain_id,
			"restored pairing session"
		);
		self.generation += 1;
		self.subscription = Some(self.listen(&provider));
		self.state.send_replace(SessionState {
			connected: true,
			address: established.address,
			chain_id: established.chain_id,
			provider: Some(provider),
			is_loading: false,
			selected_wallet: Some(descriptor),
		});
		Ok(true)
	}

	fn listen(&self, provider: &ProviderRef) -> Subscription {
		let generation = self.generation;
		let events = self.events.clone();
		provider.subscribe(Rc::new(move |event| {
			if let Some(tx) = events.upgrade() {
				let _ = tx.send(Message::Provider { generation, event });
			}
		}))
	}

	fn handle_event(&mut self, generation: u64, event: ProviderEvent) {
		if generation != self.generation || self.state.borrow().provider.is_none() {
			debug!(target = "wallet.session", event = event.name(), generation, "dropping event from superseded provider");
			return;
		}
		debug!(target = "wallet.session", event = event.name(), "provider event");

		match event {
			ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
				Some(address) => self.state.send_modify(|state| {
					state.connected = true;
					state.address = Some(normalize_address(&address));
				}),
				None => {
					info!(target = "wallet.session", "wallet exposed no accounts; resetting session");
					self.reset();
					self.notify(SessionNotice::Disconnected);
				}
			},
			ProviderEvent::ChainChanged(chain_id) => self.state.send_modify(|state| state.chain_id = Some(chain_id)),
			ProviderEvent::Connect { chain_id } => self.state.send_modify(|state| {
				state.connected = true;
				state.chain_id = chain_id.or(state.chain_id);
				state.is_loading = false;
			}),
			ProviderEvent::Disconnect { error } => {
				info!(target = "wallet.session", error = ?error, "provider disconnected");
				self.reset();
				self.notify(SessionNotice::Disconnected);
			}
		}
	}

	async fn disconnect(&mut self) {
		let provider = self.state.borrow().provider.clone();
		self.disconnect_from(provider).await;
	}

	async fn disconnect_from(&mut self, provider: Option<ProviderRef>) {
		self.state.send_modify(|state| state.is_loading = true);

		if let Some(provider) = &provider {
			if let Err(err) = provider.disconnect().await {
				warn!(target = "wallet.session", error = %err, "provider disconnect failed; resetting anyway");
			}
		}

		self.reset();
		if provider.is_some() {
			info!(target = "wallet.session", "disconnected");
			self.notify(SessionNotice::Disconnected);
		}
	}

	async fn switch_network(&mut self, chain_id: u64) -> Result<()> {
		let provider = {
			let state = self.state.borrow();
			match (&state.provider, state.connected) {
				(Some(provider), true) => Rc::clone(provider),
				_ => return Err(WalletError::NotConnected),
			}
		};

		self.state.send_modify(|state| state.is_loading = true);
		let outcome = self.unless_disconnected(try_switch(&provider, chain_id)).await;
		let result = match outcome {
			Ok(result) => result,
			Err(reply) => {
				self.preempt(Some(provider), reply).await;
				return Err(WalletError::Cancelled);
			}
		};
		self.state.send_modify(|state| state.is_loading = false);

		if let Err(error) = &result {
			warn!(target = "wallet.session", chain_id, error = %error, "failed to switch network");
			self.notify(SessionNotice::NetworkSwitchFailed {
				chain_id,
				error: error.clone(),
			});
		}
		result
	}

	/// Drops the provider subscription and publishes the empty state.
	fn reset(&mut self) {
		self.subscription = None;
		self.generation += 1;
		self.state.send_replace(SessionState::default());
	}

	fn notify(&self, notice: SessionNotice) {
		let _ = self.notices.send(notice);
	}
}

async fn handshake(provider: &ProviderRef, remote: bool, timer: &dyn Timer, config: &WalletConfig) -> Result<Established> {
	if remote {
		pair(provider, timer, config).await
	} else {
		request_accounts(provider).await
	}
}

/// Remote path: reuse a live session, otherwise enable with retries.
async fn pair(provider: &ProviderRef, timer: &dyn Timer, config: &WalletConfig) -> Result<Established> {
	if let Some(live) = live_session(provider).await? {
		return Ok(live);
	}

	enable_with_retry(&**provider, timer, config.enable_attempts, config.enable_backoff()).await?;

	let Some(address) = read_accounts(provider).await?.into_iter().next() else {
		info!(target = "wallet.session", "pairing initiated; waiting for peer accounts");
		return Ok(Established {
			address: None,
			chain_id: None,
		});
	};
	let chain_id = read_chain_id(provider).await?;
	Ok(Established {
		address: Some(address),
		chain_id,
	})
}

/// Account and chain of a pairing session that is already connected.
async fn live_session(provider: &ProviderRef) -> Result<Option<Established>> {
	if !provider.is_connected() {
		return Ok(None);
	}
	debug!(target = "wallet.session", "pairing session already live");
	let Some(address) = read_accounts(provider).await?.into_iter().next() else {
		return Ok(None);
	};
	let chain_id = read_chain_id(provider).await?;
	Ok(Some(Established {
		address: Some(address),
		chain_id,
	}))
}

/// Injected path: an explicit account request that must return an account.
async fn request_accounts(provider: &ProviderRef) -> Result<Established> {
	let accounts = parse_accounts(&provider.request(RequestArguments::request_accounts()).await?);
	let address = accounts.into_iter().next().ok_or(WalletError::NoAccounts)?;
	let chain_id = read_chain_id(provider).await?;
	Ok(Established {
		address: Some(address),
		chain_id,
	})
}

async fn read_accounts(provider: &ProviderRef) -> Result<Vec<String>> {
	Ok(parse_accounts(&provider.request(RequestArguments::accounts()).await?))
}

async fn read_chain_id(provider: &ProviderRef) -> Result<Option<u64>> {
	Ok(parse_chain_id(&provider.request(RequestArguments::chain_id()).await?))
}

async fn try_switch(provider: &ProviderRef, chain_id: u64) -> Result<()> {
	match provider.request(RequestArguments::switch_chain(chain_id)).await {
		Ok(_) => Ok(()),
		Err(err) if err.has_code(UNRECOGNIZED_CHAIN) => {
			info!(target = "wallet.session", chain_id, "chain not registered in wallet; adding it");
			let parameter = AddEthereumChainParameter::ethereum_mainnet(chain_id);
			provider.request(RequestArguments::add_chain(&parameter)).await?;
			provider.request(RequestArguments::switch_chain(chain_id)).await?;
			Ok(())
		}
		Err(err) => Err(err.into()),
	}
}
