use relay_deferred::CancellationToken;
use trace_err::*;

/// Fires `cancel_token` on SIGTERM or CTRL+C.
///
/// The listener exits on its own once the token fires for any other reason,
/// including its deadline.
pub fn listen_for_cancel(cancel_token: &CancellationToken) {
    #[cfg(unix)]
    let mut term_handler =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .trace_expect("Failed to register signal handlers");

    let cancel_token = cancel_token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = term_handler.recv();
        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            _ = terminate => {
                eprintln!("Received terminate signal, cancelling chain...");
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Received CTRL+C, cancelling chain...");
            }
            _ = cancel_token.cancelled() => {}
        }

        cancel_token.cancel();
    });
}
