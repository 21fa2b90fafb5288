//! Handling of the server's Execute Result.

use tracing::{debug, warn};

use crate::channel::{ChannelContext, RailPhase};
use crate::error::RailError;
use crate::pdu::ExecResultOrder;
use crate::session::AbortStatus;

/// Message reported to the session's consumer when the launch fails.
pub const EXEC_FAILED_MESSAGE: &str = "Failed to execute RAIL command.";

/// React to the server's report on the execute request.
///
/// A failed launch aborts the whole session as upstream-unavailable. The
/// notification itself is always acknowledged with `Ok`.
pub fn on_execute_result(
    channel: &ChannelContext,
    result: &ExecResultOrder,
) -> Result<(), RailError> {
    if result.exec_result.is_success() {
        debug!(program = %result.program, "RemoteApp program started");
        return Ok(());
    }

    debug!(
        code = u16::from(result.exec_result),
        raw = result.raw_result,
        "Failed to execute RAIL command on server: {:?}",
        result.exec_result
    );
    channel.with_phase(RailPhase::fail);

    match channel.session() {
        Some(session) => session.abort(AbortStatus::UpstreamUnavailable, EXEC_FAILED_MESSAGE),
        None => warn!("execute failed on a rail channel with no session attached"),
    }
    Ok(())
}
