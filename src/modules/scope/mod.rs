//! 清理范围解析
//!
//! 根据活动页面地址与范围设置，决定清理是否限定在单个来源上。

use serde::{Deserialize, Serialize};
use url::Url;

use crate::modules::settings::models::Scope;

/// 可以按站点清理的协议
const NETWORK_SCHEMES: &[&str] = &["http", "https"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "origin", rename_all = "snake_case")]
pub enum ScopeResolution {
    /// 不限定来源
    AllSites,
    /// 仅清理该来源 (scheme://host[:port])
    SingleOrigin(String),
    /// 当前页面无法按站点清理，例如浏览器内部页面
    Unsupported,
}

impl ScopeResolution {
    pub fn origin(&self) -> Option<&str> {
        match self {
            ScopeResolution::SingleOrigin(origin) => Some(origin),
            _ => None,
        }
    }
}

/// 解析清理范围
///
/// `scope` 为所有站点时忽略地址；为当前站点时只有 http/https 地址能得到
/// 单一来源，其它协议、无法解析或缺失的地址都视为不支持。
pub fn resolve(address: Option<&str>, scope: Scope) -> ScopeResolution {
    if scope == Scope::All {
        return ScopeResolution::AllSites;
    }

    let Some(address) = address.map(str::trim).filter(|a| !a.is_empty()) else {
        tracing::debug!("活动页面没有地址，无法按站点清理");
        return ScopeResolution::Unsupported;
    };

    let url = match Url::parse(address) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("无法解析页面地址 {}: {}", address, e);
            return ScopeResolution::Unsupported;
        }
    };

    if !NETWORK_SCHEMES.contains(&url.scheme()) {
        tracing::debug!("非网络协议页面: {}", url.scheme());
        return ScopeResolution::Unsupported;
    }

    let origin = url.origin();
    if !origin.is_tuple() {
        return ScopeResolution::Unsupported;
    }

    ScopeResolution::SingleOrigin(origin.ascii_serialization())
}
