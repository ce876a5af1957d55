// STDIO transport: one JSON-RPC message per line
use crate::application::mcp_server::McpServer;
use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_stream::wrappers::LinesStream;

/// Serve the process's stdin/stdout until stdin closes
pub async fn serve_stdio(server: McpServer) -> anyhow::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve_lines(&server, stdin, tokio::io::stdout()).await
}

pub async fn serve_lines<R, W>(server: &McpServer, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = LinesStream::new(reader.lines());
    while let Some(line) = lines.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = server.handle_message(&line).await {
            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    tracing::info!("Input closed, stopping STDIO server");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::arm_control::OfflineArm;
    use crate::domain::joint::JointBounds;
    use serde_json::Value;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_one_reply_per_request_line() {
        let server = McpServer::new(Arc::new(OfflineArm), JointBounds::mycobot_280());
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );
        let mut output = Vec::new();

        serve_lines(&server, input.as_bytes(), &mut output).await.unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"], serde_json::json!({}));
    }
}
