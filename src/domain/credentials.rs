// ==========================================
// 制造运营管理系统 - 调用凭据
// ==========================================
// 会话由外部认证模块提供，这里只负责携带
// ==========================================

use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.token.trim().is_empty()
    }
}

// token 不进日志
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"***")
            .field("user_id", &self.user_id)
            .finish()
    }
}
