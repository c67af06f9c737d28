//! ABI bindings of the contracts the client talks to.
//!
//! Only the entry points the client encodes calls for, or reads from, are declared here.

use alloy_sol_types::sol;

sol! {
    /// The wallet account (implementation behind the proxy).
    #[derive(Debug, PartialEq, Eq)]
    interface IAccount {
        /// The transaction layout the account receives for outside execution. It mirrors the
        /// signed typed fields and adds reserved slots the account ignores.
        struct Transaction {
            uint256 txType;
            uint256 from;
            uint256 to;
            uint256 gasLimit;
            uint256 gasPerPubdataByteLimit;
            uint256 maxFeePerGas;
            uint256 maxPriorityFeePerGas;
            uint256 paymaster;
            uint256 nonce;
            uint256 value;
            uint256[4] reserved;
            bytes data;
            bytes signature;
            bytes32[] factoryDeps;
            bytes paymasterInput;
            bytes reservedDynamic;
        }

        /// The escape as stored by the account.
        struct Escape {
            uint32 activeAt;
            uint8 escapeType;
            address newSigner;
        }

        function initialize(address owner, address guardian) external;

        function executeTransactionFromOutside(Transaction calldata transaction) external;

        function changeOwner(address newOwner) external;
        function changeGuardian(address newGuardian) external;
        function changeGuardianBackup(address newGuardianBackup) external;

        function triggerEscapeOwner(address newOwner) external;
        function triggerEscapeGuardian(address newGuardian) external;
        function escapeOwner() external;
        function escapeGuardian() external;
        function cancelEscape() external;

        function owner() external view returns (address);
        function guardian() external view returns (address);
        function guardianBackup() external view returns (address);
        function escape() external view returns (Escape memory);
        function guardianEscapeAttempts() external view returns (uint32);

        event EscapeOwnerTriggerred(uint32 activeAt, address newOwner);
        event EscapeGuardianTriggerred(uint32 activeAt, address newGuardian);
        event OwnerEscaped(address newOwner);
        event GuardianEscaped(address newGuardian);
        event EscapeCanceled();
    }

    /// The factory deploying wallet proxies at deterministic addresses.
    #[derive(Debug, PartialEq, Eq)]
    interface IAccountFactory {
        function deployProxyAccount(
            bytes32 salt,
            address implementation,
            address owner,
            address guardian
        ) external returns (address accountAddress);

        function computeCreate2Address(
            bytes32 salt,
            address implementation,
            address owner,
            address guardian
        ) external view returns (address accountAddress);
    }

    /// The system contract recording contract creations.
    #[derive(Debug, PartialEq, Eq)]
    interface IContractDeployer {
        event ContractDeployed(
            address indexed deployerAddress,
            bytes32 indexed bytecodeHash,
            address indexed contractAddress
        );
    }
}
