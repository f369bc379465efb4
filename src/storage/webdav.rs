use super::{DirEntry, ServerEndpoint, Storage};
use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use opendal::{Metakey, Operator};

pub struct WebDavStorage {
    operator: Operator,
    name: String,
}

impl WebDavStorage {
    /// 创建 WebDAV 存储，不会发起网络请求（认证延迟到第一次操作）
    pub fn new(endpoint: &ServerEndpoint) -> Result<Self> {
        use opendal::services::Webdav;

        let builder = Webdav::default()
            .endpoint(&endpoint.url)
            .username(&endpoint.username)
            .password(&endpoint.password);

        let operator = Operator::new(builder)?.finish();
        let name = endpoint.url.trim_end_matches('/').to_string();

        Ok(Self::from_operator(operator, name))
    }

    fn from_operator(operator: Operator, name: String) -> Self {
        Self { operator, name }
    }
}

/// 转换为 opendal 的文件路径（去掉开头的 /）
fn object_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// 转换为 opendal 的目录路径，根目录为 "/"
fn dir_path(path: &str) -> String {
    let path = object_path(path);
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else {
        format!("{}/", path)
    }
}

#[async_trait]
impl Storage for WebDavStorage {
    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let dir = dir_path(path);
        let mut entries = Vec::new();

        let mut lister = self
            .operator
            .lister_with(&dir)
            .metakey(Metakey::ContentLength | Metakey::LastModified | Metakey::Mode)
            .await?;

        while let Some(entry) = lister.try_next().await? {
            // 跳过目录自身
            if entry.path().trim_start_matches('/') == dir.trim_start_matches('/') {
                continue;
            }

            let name = entry.name().trim_end_matches('/');
            if name.is_empty() {
                continue;
            }

            let meta = entry.metadata();
            let is_dir = meta.is_dir();

            entries.push(DirEntry {
                name: name.to_string(),
                size: if is_dir { 0 } else { meta.content_length() },
                modified_time: meta.last_modified().map_or(0, |t| t.timestamp()),
                is_dir,
            });
        }

        Ok(entries)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let data = self.operator.read(&object_path(path)).await?;
        Ok(data.to_vec())
    }

    async fn write(&self, path: &str, data: Vec<u8>) -> Result<()> {
        let path = object_path(path);

        // 逐级创建父目录，忽略错误（目录可能已存在）
        if let Some((parent, _)) = path.rsplit_once('/') {
            let mut current_path = String::new();
            for part in parent.split('/').filter(|s| !s.is_empty()) {
                current_path.push_str(part);
                current_path.push('/');
                let _ = self.operator.create_dir(&current_path).await;
            }
        }

        self.operator.write(&path, data).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = object_path(path);

        // opendal 的 delete 对不存在的路径返回成功，这里需要报错
        match self.operator.stat(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => {
                return Err(anyhow::anyhow!("路径不存在: /{}", path));
            }
            Err(e) => return Err(e.into()),
        }

        self.operator.delete(&path).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
