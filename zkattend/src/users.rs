//! User enrollment operations

use tracing::{debug, info};
use zkattend_core::constants::DATA_REPLY_SIZE;
use zkattend_core::Command;
use zkattend_types::User;

use crate::channel::BufferedRequest;
use crate::device::{split_records, Device};
use crate::error::{Error, Result};

impl Device {
    /// Read every enrolled user
    pub async fn get_users(&mut self) -> Result<Vec<User>> {
        let result = self.read_users().await;
        self.report(result)
    }

    /// Write a user record, replacing any user with the same index
    pub async fn create_user(&mut self, user: &User) -> Result<()> {
        let result = self.write_user(user).await;
        self.report(result)
    }

    /// Same as [`Device::create_user`]; the device overwrites by index
    pub async fn update_user(&mut self, user: &User) -> Result<()> {
        self.create_user(user).await
    }

    /// Enroll a new user in the slot after the highest index in use
    pub async fn add_user(&mut self, name: &str, user_id: &str) -> Result<User> {
        let result = self.enroll_user(name, user_id).await;
        self.report(result)
    }

    pub async fn delete_user(&mut self, index: u16) -> Result<()> {
        let result = self.remove_user(index).await;
        self.report(result)
    }

    /// Delete the slot `user` was read from
    pub async fn delete_user_record(&mut self, user: &User) -> Result<()> {
        self.delete_user(user.index).await
    }

    async fn read_users(&mut self) -> Result<Vec<User>> {
        let counts = self.read_storage().await?;
        if counts.users <= 0 {
            return Ok(Vec::new());
        }

        self.ensure_connected()?;
        let data = self
            .channel
            .read_buffered(Command::ReadUsers, BufferedRequest::users())
            .await?;

        let (width, records) = split_records(&data, counts.users as usize)?;
        if width != User::RECORD_SIZE {
            return Err(Error::InvalidResponse(format!(
                "user records are {width} bytes, expected {}",
                User::RECORD_SIZE
            )));
        }

        let users = records.map(User::decode).collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(count = users.len(), "Read users");

        Ok(users)
    }

    async fn write_user(&mut self, user: &User) -> Result<()> {
        let record = user.encode()?;

        self.expect_success(Command::CreateUser, &record, DATA_REPLY_SIZE)
            .await?;
        self.command(Command::RefreshData, &[]).await?;

        info!(index = user.index, user_id = %user.user_id, "User written");
        Ok(())
    }

    async fn enroll_user(&mut self, name: &str, user_id: &str) -> Result<User> {
        let users = self.read_users().await?;
        let last = users.iter().map(|u| u.index).max().unwrap_or(0);
        let index = last
            .checked_add(1)
            .ok_or_else(|| Error::InvalidResponse("no free user index".into()))?;

        let user = User::new(index, user_id, name);
        self.write_user(&user).await?;

        Ok(user)
    }

    async fn remove_user(&mut self, index: u16) -> Result<()> {
        self.command(Command::DeleteUser, &index.to_le_bytes()).await?;
        self.command(Command::RefreshData, &[]).await?;

        info!(index, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::{connected, errors, storage_payload};
    use crate::testing::Reply;
    use pretty_assertions::assert_eq;
    use zkattend_types::Privilege;

    fn user_record(index: u16, user_id: &str, name: &str) -> Vec<u8> {
        let mut record = vec![0u8; 72];
        record[0..2].copy_from_slice(&index.to_le_bytes());
        record[2] = 14;
        record[11..11 + name.len()].copy_from_slice(name.as_bytes());
        record[35..39].copy_from_slice(&555i32.to_le_bytes());
        record[48..48 + user_id.len()].copy_from_slice(user_id.as_bytes());
        record
    }

    #[tokio::test]
    async fn test_get_users_decodes_records() {
        let (mut device, handle) = connected().await;

        let records = [user_record(1, "E1", "Ada"), user_record(2, "E2", "Grace")];
        let mut table = 144u32.to_le_bytes().to_vec();
        table.extend_from_slice(&records.concat());

        let mut announce = vec![0u8];
        announce.extend_from_slice(&(table.len() as u32).to_le_bytes());

        handle.reply(Command::Success, &storage_payload(2, 0));
        handle.reply(Command::Success, &announce);
        handle.reply(Command::PrepareData, &[0; 8]);
        handle.push(Reply::Buffered(table));
        handle.success();
        handle.success();

        let users = device.get_users().await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].index, 1);
        assert_eq!(users[0].name, "Ada");
        assert_eq!(users[0].user_id, "E1");
        assert_eq!(users[0].privilege, Privilege::Admin);
        assert_eq!(users[0].card, 555);
        assert_eq!(users[1].name, "Grace");
        assert_eq!(
            handle.sent_commands()[1..].to_vec(),
            vec![
                Command::CheckStorage,
                Command::PrepareBuffers,
                Command::ReadBuffer,
                Command::ClearBuffers
            ]
        );
    }

    #[tokio::test]
    async fn test_get_users_empty_skips_buffered_read() {
        let (mut device, handle) = connected().await;
        handle.reply(Command::Success, &storage_payload(0, 10));

        assert!(device.get_users().await.unwrap().is_empty());
        assert_eq!(
            handle.sent_commands(),
            vec![Command::Connect, Command::CheckStorage]
        );
    }

    #[tokio::test]
    async fn test_get_users_wrong_width_reports_once() {
        let (mut device, handle) = connected().await;
        let mut events = device.subscribe();

        // Two 70-byte records behind the size prefix
        let mut inline = 140u32.to_le_bytes().to_vec();
        inline.extend_from_slice(&[0; 140]);

        handle.reply(Command::Success, &storage_payload(2, 0));
        handle.reply(Command::SendData, &inline);

        assert!(matches!(
            device.get_users().await,
            Err(Error::InvalidResponse(_))
        ));
        assert_eq!(errors(&mut events).len(), 1);
    }

    #[tokio::test]
    async fn test_get_users_fails_without_storage() {
        let (mut device, handle) = connected().await;
        handle.reply(Command::FailedExecute, &[]);

        assert!(device.get_users().await.is_err());
        assert_eq!(
            handle.sent_commands(),
            vec![Command::Connect, Command::CheckStorage]
        );
    }

    #[tokio::test]
    async fn test_create_user_then_refresh() {
        let (mut device, handle) = connected().await;
        handle.success();
        handle.success();

        let user = User::new(9, "E9", "Linus");
        device.create_user(&user).await.unwrap();

        let sent = handle.sent();
        assert_eq!(sent[1].command, Command::CreateUser);
        assert_eq!(sent[1].payload, user.encode().unwrap());
        assert_eq!(sent[2].command, Command::RefreshData);
    }

    #[tokio::test]
    async fn test_create_user_rejects_long_name_before_sending() {
        let (mut device, handle) = connected().await;

        let user = User::new(1, "E1", "a display name longer than the slot");
        assert!(matches!(
            device.create_user(&user).await,
            Err(Error::Types(_))
        ));
        assert_eq!(handle.sent_commands(), vec![Command::Connect]);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (mut device, handle) = connected().await;
        handle.success();
        handle.success();

        device.delete_user(0x0102).await.unwrap();

        let sent = handle.sent();
        assert_eq!(sent[1].command, Command::DeleteUser);
        assert_eq!(sent[1].payload.as_ref(), &[0x02, 0x01]);
        assert_eq!(sent[2].command, Command::RefreshData);
    }

    #[tokio::test]
    async fn test_delete_user_record_uses_index() {
        let (mut device, handle) = connected().await;
        handle.success();
        handle.success();

        let user = User::new(7, "E1042", "Grace");
        device.delete_user_record(&user).await.unwrap();

        let sent = handle.sent();
        assert_eq!(sent[1].command, Command::DeleteUser);
        assert_eq!(sent[1].payload.as_ref(), &[0x07, 0x00]);
        assert_eq!(sent[2].command, Command::RefreshData);
    }

    #[tokio::test]
    async fn test_delete_user_rejected_skips_refresh() {
        let (mut device, handle) = connected().await;
        handle.reply(Command::FailedExecute, &[]);

        assert!(device.delete_user(3).await.is_err());
        assert_eq!(
            handle.sent_commands(),
            vec![Command::Connect, Command::DeleteUser]
        );
    }

    #[tokio::test]
    async fn test_add_user_takes_next_index() {
        let (mut device, handle) = connected().await;

        let mut inline = 72u32.to_le_bytes().to_vec();
        inline.extend_from_slice(&user_record(4, "E4", "Ken"));

        handle.reply(Command::Success, &storage_payload(1, 0));
        handle.reply(Command::SendData, &inline);
        handle.success(); // CreateUser
        handle.success(); // RefreshData

        let user = device.add_user("Dennis", "E5").await.unwrap();

        assert_eq!(user.index, 5);
        assert_eq!(user.user_id, "E5");
        assert_eq!(
            handle.sent_commands()[3..].to_vec(),
            vec![Command::CreateUser, Command::RefreshData]
        );
    }
}
