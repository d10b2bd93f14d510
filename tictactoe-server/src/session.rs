//! 连接会话
//!
//! 每个连接两个任务：读循环把命令交给协调任务，写任务把发件箱里的
//! 事件写回套接字。

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use protocol::{ClientCommand, ConnectionId, FrameReader, FrameWriter, ProtocolError, ServerEvent};

use crate::coordinator::CoordinatorHandle;

/// 单次写入合并的最大事件数
const MAX_BATCH: usize = 16;

/// 运行一个连接会话，直到对端断开或协调任务退出
pub async fn run_session<R, W>(
    id: ConnectionId,
    mut reader: FrameReader<R>,
    writer: FrameWriter<W>,
    inbox: UnboundedReceiver<ServerEvent>,
    handle: CoordinatorHandle,
) where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer_task = spawn_writer(id, writer, inbox);

    loop {
        match reader.read_frame::<ClientCommand>().await {
            Ok(commands) => {
                for command in commands {
                    if !handle.dispatch(id, command).await {
                        debug!(id, "协调任务已退出");
                        writer_task.abort();
                        return;
                    }
                }
            }
            Err(ProtocolError::ConnectionClosed) => {
                info!(id, "对端关闭连接");
                break;
            }
            Err(e) => {
                warn!(id, error = %e, "读取失败");
                break;
            }
        }
    }

    handle.disconnect(id).await;
    // 注销后发件箱关闭，写任务随之结束
    if let Err(e) = writer_task.await {
        debug!(id, error = %e, "写任务异常结束");
    }
}

fn spawn_writer<W>(
    id: ConnectionId,
    mut writer: FrameWriter<W>,
    mut inbox: UnboundedReceiver<ServerEvent>,
) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut batch = Vec::with_capacity(MAX_BATCH);

        while let Some(event) = inbox.recv().await {
            batch.push(event);
            while batch.len() < MAX_BATCH {
                match inbox.try_recv() {
                    Ok(event) => batch.push(event),
                    Err(_) => break,
                }
            }

            if let Err(e) = writer.write_frame(&batch).await {
                debug!(id, error = %e, "写入失败，停止发送");
                return;
            }
            batch.clear();
        }

        let _ = writer.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::spawn_coordinator;
    use crate::server::ServerState;
    use protocol::WireMessage;
    use std::time::Duration;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_session_relays_both_ways() {
        let (handle, task) = spawn_coordinator(ServerState::new());

        let (client, server) = duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let (outbox, inbox) = unbounded_channel();
        let id = handle.connect(outbox, None).await.unwrap();
        let session = tokio::spawn(run_session(
            id,
            FrameReader::new(server_read),
            FrameWriter::new(server_write),
            inbox,
            handle.clone(),
        ));

        // 首位玩家收到等待提示
        let mut buf = vec![0; 1024];
        let n = tokio::time::timeout(Duration::from_secs(2), client_read.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let text = String::from_utf8_lossy(&buf[..n]).to_string();
        assert!(text.contains("`CHAT|Waiting for another player..."));

        let set_name = ClientCommand::SetName("Ann".to_string()).encode();
        client_write
            .write_all(format!("`{}", set_name).as_bytes())
            .await
            .unwrap();
        let n = tokio::time::timeout(Duration::from_secs(2), client_read.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"`CHAT|Ann has connected.");

        // 关闭客户端写端，会话注销连接
        client_write.shutdown().await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), session)
            .await
            .unwrap()
            .unwrap();

        drop(handle);
        let state = task.await.unwrap();
        assert!(state.registry.is_empty());
    }
}
