//! ID 生成

use uuid::Uuid;

use super::{JoinCode, RoomId, ValueObjectError, value_object::JOIN_CODE_LENGTH};

/// RoomId の生成
pub struct RoomIdFactory;

impl RoomIdFactory {
    pub fn generate() -> Result<RoomId, ValueObjectError> {
        RoomId::new(Uuid::new_v4().simple().to_string())
    }
}

/// 5 桁の参加コードの生成
///
/// 一意性はここでは保証しない。呼び出し側が稼働中の Room と照合する。
pub struct JoinCodeFactory;

impl JoinCodeFactory {
    pub fn generate() -> Result<JoinCode, ValueObjectError> {
        let modulus = 10u128.pow(JOIN_CODE_LENGTH as u32);
        let number = Uuid::new_v4().as_u128() % modulus;
        JoinCode::new(format!("{:0width$}", number, width = JOIN_CODE_LENGTH))
    }
}
