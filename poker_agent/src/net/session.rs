//! The request/decide/respond loop.
//!
//! A session sends the handshake, then reads frames one at a time. Every
//! decoded message goes through the tracker before the agent sees it, and
//! the agent is only asked for a decision when the server requests one.

use std::fmt;

use log::{debug, info, warn};

use super::{
    super::game::{GameState, Tracker},
    codec,
    errors::{SessionError, StopSession},
    message_log::{Direction, MessageSink},
    messages::{ActionRequest, ConnectRequest, GameCompleted, HandResult, Message, OutgoingAction},
    transport::{Frame, Transport},
};

/// Decision logic driven by a [`Session`].
///
/// Every callback receives the tracked state after the triggering message
/// has been applied. Returning [`StopSession`] from any callback ends the
/// session cleanly; any other error ends it with [`SessionError::Agent`].
pub trait Agent {
    fn decide(&mut self, request: &ActionRequest, state: &GameState) -> anyhow::Result<OutgoingAction>;

    fn on_hand_start(&mut self, _state: &GameState) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after every game update and player action.
    fn on_update(&mut self, _state: &GameState) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_street_change(&mut self, _state: &GameState) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_hand_complete(&mut self, _result: &HandResult, _state: &GameState) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_game_completed(&mut self, _summary: &GameCompleted) -> anyhow::Result<()> {
        Ok(())
    }
}

/// How a session ended without error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionOutcome {
    GameCompleted,
    ConnectionClosed,
    HandLimitReached,
    /// An agent callback returned [`StopSession`].
    Stopped,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::GameCompleted => "game completed",
            Self::ConnectionClosed => "connection closed",
            Self::HandLimitReached => "hand limit reached",
            Self::Stopped => "stopped",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub hands_played: u64,
}

enum Step {
    Continue,
    Finish(SessionOutcome),
}

fn callback<T>(result: anyhow::Result<T>) -> Result<Result<T, SessionOutcome>, SessionError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(error) if error.is::<StopSession>() => Ok(Err(SessionOutcome::Stopped)),
        Err(error) => Err(SessionError::Agent(error)),
    }
}

fn notify(result: anyhow::Result<()>) -> Result<Step, SessionError> {
    Ok(match callback(result)? {
        Ok(()) => Step::Continue,
        Err(outcome) => Step::Finish(outcome),
    })
}

pub struct Session<T: Transport> {
    transport: T,
    tracker: Tracker,
    sink: Option<Box<dyn MessageSink>>,
    hand_limit: Option<u64>,
    hands_played: u64,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            tracker: Tracker::new(),
            sink: None,
            hand_limit: None,
            hands_played: 0,
        }
    }

    pub fn with_message_sink(mut self, sink: Box<dyn MessageSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// End the session cleanly once this many hands have finished.
    pub fn with_hand_limit(mut self, limit: Option<u64>) -> Self {
        self.hand_limit = limit;
        self
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send the handshake and process frames until the session ends.
    ///
    /// # Errors
    ///
    /// Decode, tracker and transport failures end the session immediately,
    /// as do server error messages and agent callback errors other than
    /// [`StopSession`].
    pub fn run<A: Agent + ?Sized>(
        &mut self,
        connect: &ConnectRequest,
        agent: &mut A,
    ) -> Result<SessionReport, SessionError> {
        let handshake = codec::encode_connect(connect)?;
        self.send(&handshake, "connect")?;
        info!("joined as {}", connect.name);

        let outcome = loop {
            match self.transport.read_frame()? {
                Frame::Binary(bytes) => {
                    if let Step::Finish(outcome) = self.handle_frame(&bytes, agent)? {
                        break outcome;
                    }
                }
                Frame::Ping(payload) => self.transport.reply_pong(&payload)?,
                Frame::Text(text) => warn!("ignoring text frame ({} bytes)", text.len()),
                Frame::Close => break SessionOutcome::ConnectionClosed,
            }
        };

        if outcome != SessionOutcome::ConnectionClosed {
            if let Err(error) = self.transport.close() {
                warn!("couldn't close the connection cleanly: {error}");
            }
        }
        info!("session ended: {outcome} after {} hands", self.hands_played);
        Ok(SessionReport {
            outcome,
            hands_played: self.hands_played,
        })
    }

    fn handle_frame<A: Agent + ?Sized>(&mut self, bytes: &[u8], agent: &mut A) -> Result<Step, SessionError> {
        if self.sink.is_some() {
            let message_type = codec::read_type(bytes).unwrap_or("malformed");
            self.log(Direction::Inbound, message_type, bytes);
        }
        let message = codec::decode(bytes)?;
        debug!("received {message}");
        self.tracker.apply(&message)?;
        let state = self.tracker.state();

        match &message {
            Message::HandStart(_) => notify(agent.on_hand_start(state)),
            Message::ActionRequest(request) => {
                let action = match callback(agent.decide(request, state))? {
                    Ok(action) => action,
                    Err(outcome) => return Ok(Step::Finish(outcome)),
                };
                let payload = codec::encode_action(&action)?;
                self.send(&payload, "action")?;
                info!("hand {}: hero {action}", self.tracker.state().hand_id);
                self.tracker.record_hero_action(&action);
                Ok(Step::Continue)
            }
            Message::GameUpdate(_) | Message::PlayerAction(_) => notify(agent.on_update(state)),
            Message::StreetChange(_) => notify(agent.on_street_change(state)),
            Message::HandResult(result) => {
                let step = notify(agent.on_hand_complete(result, state))?;
                self.hands_played += 1;
                if let Step::Finish(outcome) = step {
                    return Ok(Step::Finish(outcome));
                }
                if self.hand_limit.is_some_and(|limit| self.hands_played >= limit) {
                    return Ok(Step::Finish(SessionOutcome::HandLimitReached));
                }
                self.tracker.reset();
                Ok(Step::Continue)
            }
            Message::GameCompleted(summary) => {
                notify(agent.on_game_completed(summary))?;
                Ok(Step::Finish(SessionOutcome::GameCompleted))
            }
            Message::Error(error) => Err(SessionError::Server {
                message: error.message.clone(),
                code: error.code.clone(),
            }),
            Message::NoOp => Ok(Step::Continue),
        }
    }

    fn send(&mut self, payload: &[u8], message_type: &str) -> Result<(), SessionError> {
        self.log(Direction::Outbound, message_type, payload);
        self.transport.write_frame(payload)?;
        Ok(())
    }

    fn log(&mut self, direction: Direction, message_type: &str, raw: &[u8]) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let payload = codec::frame_to_json(raw).ok();
        if let Err(error) = sink.record(direction, message_type, raw, payload.as_ref()) {
            warn!("couldn't record {direction} {message_type} message: {error}");
        }
    }
}
