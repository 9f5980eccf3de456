use secrecy::SecretString;

/// 远程存储连接配置
#[derive(Debug)]
pub struct StoreConfig {
    /// 项目 URL，例如 `https://abc.supabase.co`
    pub url: String,
    /// 公开的 anon key，作为 `apikey` 请求头发送
    pub anon_key: SecretString,
    /// 用户 access token，没有时使用 anon key
    pub access_token: Option<SecretString>,
    /// 单次请求超时，未设置时不限
    pub timeout_secs: Option<u64>,
}
