// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 轻量页面审计结果
///
/// 每个爬取到的页面都会产出一份，字段缺失时退化为空值或零
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LightAudit {
    /// `<title>` 文本
    pub title: Option<String>,
    /// meta description，缺失时回退到 og:description
    pub meta_description: Option<String>,
    pub h1_count: u32,
    pub h2_count: u32,
    /// 按空白切分的正文词数
    pub word_count: u32,
    /// 图片总数
    pub images: u32,
    /// 缺少 alt 属性的图片数
    pub images_without_alt: u32,
    /// 指向同源地址的链接数
    pub internal_link_count: u32,
}
