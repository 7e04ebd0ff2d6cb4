// ==========================================
// 周度内容排期引擎 - 配额分配引擎
// ==========================================
// 红线: 同日相邻两条不得为同一发送类型（宁可少排）
// 红线: 单日上限优先于周上限
// ==========================================
// 职责: 把每日类别配额填充为具体发送类型
// 输入: VolumeConfig + 历史表现 + 有效活动列表
// 输出: 每日 AllocationItem 序列 + AllocationShortfall 告警
// ==========================================

mod balance;
mod interleave;
mod selection;


pub use selection::SlotAllocator;
